use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AuthzError;
use crate::principal::Role;
use crate::rule::{self, Rule};

/// Immutable (kind, action) -> rule map. Built once at startup through
/// [`RuleTableBuilder`], then only read, so sharing it across request
/// workers needs no locking.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    kinds: BTreeMap<String, BTreeMap<String, Rule>>,
}

impl RuleTable {
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    pub fn lookup(&self, kind: &str, action: &str) -> Option<&Rule> {
        self.kinds.get(kind)?.get(action)
    }

    pub fn knows_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Every registered (kind, action) pair, in stable order.
    pub fn registrations(&self) -> impl Iterator<Item = (&str, &str, &Rule)> {
        self.kinds.iter().flat_map(|(kind, actions)| {
            actions
                .iter()
                .map(move |(action, rule)| (kind.as_str(), action.as_str(), rule))
        })
    }

    pub fn len(&self) -> usize {
        self.kinds.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Startup-time registration. Each pair may be bound exactly once;
/// [`build`](RuleTableBuilder::build) reports the first duplicate instead
/// of silently overwriting a rule.
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    kinds: BTreeMap<String, BTreeMap<String, Rule>>,
    duplicate: Option<(String, String)>,
}

impl RuleTableBuilder {
    pub fn rule(mut self, kind: &str, action: &str, rule: Rule) -> Self {
        let actions = self.kinds.entry(kind.to_string()).or_default();
        if actions.insert(action.to_string(), rule).is_some() && self.duplicate.is_none() {
            self.duplicate = Some((kind.to_string(), action.to_string()));
        }
        self
    }

    pub fn resource(mut self, rules: ResourceRules) -> Self {
        for ((kind, action), rule) in rules.into_rules() {
            self = self.rule_owned(kind, action, rule);
        }
        self
    }

    fn rule_owned(mut self, kind: String, action: String, rule: Rule) -> Self {
        let actions = self.kinds.entry(kind.clone()).or_default();
        if actions.insert(action.clone(), rule).is_some() && self.duplicate.is_none() {
            self.duplicate = Some((kind, action));
        }
        self
    }

    pub fn build(self) -> Result<RuleTable, AuthzError> {
        if let Some((kind, action)) = self.duplicate {
            return Err(AuthzError::DuplicateRule { kind, action });
        }
        Ok(RuleTable { kinds: self.kinds })
    }
}

/// Per-resource-type rule template.
///
/// Most kinds share one shape: `view_any` is tenant-bound, `view` falls
/// back to ownership or the parent's view rule, `update`/`delete` pair an
/// owner arm (optionally state-gated) with a manager-role arm, and
/// `restore`/`force_delete` delegate to `update`/`delete`. The template
/// registers that shape and takes overrides where a kind needs stricter or
/// looser gates, so the catalog declares data instead of repeating logic.
#[derive(Debug)]
pub struct ResourceRules {
    kind: String,
    owner_field: String,
    managers: Vec<Role>,
    blocked_states: Vec<String>,
    overrides: BTreeMap<&'static str, Rule>,
    admin_restore: bool,
    admin_force_delete: bool,
    omitted: Vec<String>,
    extra: Vec<(String, Rule)>,
}

impl ResourceRules {
    pub fn new(kind: impl Into<String>) -> Self {
        ResourceRules {
            kind: kind.into(),
            owner_field: "created_by".to_string(),
            managers: vec![Role::Admin, Role::ProjectManager],
            blocked_states: Vec::new(),
            overrides: BTreeMap::new(),
            admin_restore: false,
            admin_force_delete: false,
            omitted: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Name of the id field that marks the owner (`created_by`,
    /// `uploaded_by`, `inspector_id`, ...).
    pub fn owner(mut self, field: impl Into<String>) -> Self {
        self.owner_field = field.into();
        self
    }

    /// Roles whose holders pass the role arm of `update`/`delete`.
    pub fn managers(mut self, roles: &[Role]) -> Self {
        self.managers = roles.to_vec();
        self
    }

    /// States in which the owner arm of `update`/`delete` is blocked.
    /// Manager roles are unaffected.
    pub fn blocked_states(mut self, states: &[&str]) -> Self {
        self.blocked_states = states.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn view_any(mut self, rule: Rule) -> Self {
        self.overrides.insert("view_any", rule);
        self
    }

    pub fn view(mut self, rule: Rule) -> Self {
        self.overrides.insert("view", rule);
        self
    }

    pub fn create(mut self, rule: Rule) -> Self {
        self.overrides.insert("create", rule);
        self
    }

    pub fn update(mut self, rule: Rule) -> Self {
        self.overrides.insert("update", rule);
        self
    }

    pub fn delete(mut self, rule: Rule) -> Self {
        self.overrides.insert("delete", rule);
        self
    }

    pub fn restore(mut self, rule: Rule) -> Self {
        self.overrides.insert("restore", rule);
        self
    }

    pub fn force_delete(mut self, rule: Rule) -> Self {
        self.overrides.insert("force_delete", rule);
        self
    }

    /// Gate `restore` to admins instead of delegating to `update`.
    pub fn admin_restore(mut self) -> Self {
        self.admin_restore = true;
        self
    }

    /// Gate `force_delete` to admins instead of delegating to `delete`.
    pub fn admin_force_delete(mut self) -> Self {
        self.admin_force_delete = true;
        self
    }

    /// Drop template actions that make no sense for this kind.
    pub fn without(mut self, actions: &[&str]) -> Self {
        self.omitted = actions.iter().map(|a| (*a).to_string()).collect();
        self
    }

    /// Register an additional workflow action (`approve`, `close`, ...).
    pub fn action(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.extra.push((name.into(), rule));
        self
    }

    fn owner_arm(&self) -> Rule {
        let owned = rule::is_owner(self.owner_field.clone());
        if self.blocked_states.is_empty() {
            return owned;
        }
        let states: Vec<&str> = self.blocked_states.iter().map(String::as_str).collect();
        owned.and(rule::state_not_in(&states))
    }

    fn default_rule(&self, action: &str) -> Rule {
        match action {
            "view_any" => rule::always(),
            "view" => rule::is_owner(self.owner_field.clone()).or(rule::parent("view")),
            "create" => rule::always(),
            "update" | "delete" => self
                .owner_arm()
                .or(rule::has_any_role(&self.managers)),
            "restore" => {
                if self.admin_restore {
                    rule::has_role(Role::Admin)
                } else {
                    rule::delegate("update")
                }
            }
            "force_delete" => {
                if self.admin_force_delete {
                    rule::has_role(Role::Admin)
                } else {
                    rule::delegate("delete")
                }
            }
            _ => rule::always(),
        }
    }

    fn into_rules(mut self) -> Vec<((String, String), Rule)> {
        const TEMPLATE_ACTIONS: [&str; 7] = [
            "view_any",
            "view",
            "create",
            "update",
            "delete",
            "restore",
            "force_delete",
        ];

        let mut out = Vec::new();
        let mut overrides = std::mem::take(&mut self.overrides);
        for action in TEMPLATE_ACTIONS {
            if self.omitted.iter().any(|a| a == action) {
                continue;
            }
            let rule = overrides
                .remove(action)
                .unwrap_or_else(|| self.default_rule(action));
            out.push(((self.kind.clone(), action.to_string()), rule));
        }
        for (name, rule) in std::mem::take(&mut self.extra) {
            out.push(((self.kind.clone(), name), rule));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Predicate;

    #[test]
    fn template_registers_the_full_crud_shape() {
        let table = RuleTable::builder()
            .resource(ResourceRules::new("task"))
            .build()
            .unwrap();

        for action in [
            "view_any",
            "view",
            "create",
            "update",
            "delete",
            "restore",
            "force_delete",
        ] {
            assert!(table.lookup("task", action).is_some(), "missing {action}");
        }
        assert_eq!(table.len(), 7);
        assert!(table.knows_kind("task"));
        assert!(!table.knows_kind("widget"));
    }

    #[test]
    fn restore_delegates_unless_admin_gated() {
        let table = RuleTable::builder()
            .resource(ResourceRules::new("task"))
            .resource(ResourceRules::new("project").admin_restore().admin_force_delete())
            .build()
            .unwrap();

        match table.lookup("task", "restore") {
            Some(Predicate::Delegate { action }) => assert_eq!(action, "update"),
            other => panic!("expected delegation, got {other:?}"),
        }
        match table.lookup("project", "restore") {
            Some(Predicate::HasAnyRole(roles)) => assert_eq!(roles, &[Role::Admin]),
            other => panic!("expected admin gate, got {other:?}"),
        }
    }

    #[test]
    fn without_drops_template_actions() {
        let table = RuleTable::builder()
            .resource(ResourceRules::new("invitation").without(&["restore", "force_delete"]))
            .build()
            .unwrap();
        assert!(table.lookup("invitation", "restore").is_none());
        assert!(table.lookup("invitation", "update").is_some());
    }

    #[test]
    fn duplicate_registration_is_reported() {
        let err = RuleTable::builder()
            .rule("task", "close", rule::always())
            .rule("task", "close", rule::always())
            .build()
            .unwrap_err();
        match err {
            AuthzError::DuplicateRule { kind, action } => {
                assert_eq!(kind, "task");
                assert_eq!(action, "close");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn registrations_iterates_in_stable_order() {
        let table = RuleTable::builder()
            .rule("b", "view", rule::always())
            .rule("a", "view", rule::always())
            .rule("a", "close", rule::always())
            .build()
            .unwrap();
        let pairs: Vec<(&str, &str)> = table
            .registrations()
            .map(|(kind, action, _)| (kind, action))
            .collect();
        assert_eq!(pairs, vec![("a", "close"), ("a", "view"), ("b", "view")]);
    }
}
