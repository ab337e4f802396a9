use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::audit::{AuditSink, DecisionEvent};
use crate::decision::{Decision, Reason};
use crate::error::AuthzError;
use crate::principal::Principal;
use crate::resolver::{self, Capabilities};
use crate::resource::ResourceView;
use crate::rule::{Predicate, Rule};
use crate::table::RuleTable;
use crate::tenant::same_tenant;

/// Delegation chains longer than this are registration defects, not
/// legitimate policies.
pub const MAX_DELEGATION_DEPTH: usize = 4;

/// Orchestrates one authorization call: resolve capabilities, apply the
/// super-admin bypass, run the tenant guard, look up and evaluate the
/// rule. Stateless per call; the table is immutable, so a shared `Engine`
/// is safe from any number of request workers.
pub struct Engine {
    table: RuleTable,
    audit: Option<Arc<dyn AuditSink>>,
}

enum Verdict {
    Pass,
    Fail(Reason),
}

impl Engine {
    pub fn new(table: RuleTable) -> Self {
        Engine { table, audit: None }
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Decide whether `principal` may perform `action` on the resource.
    ///
    /// `resource` is the already-loaded target, absent for collection
    /// checks (`view_any`) and creation; `parent` carries the enclosing
    /// resource for nested checks ("create a payment under this
    /// contract"). Ordinary refusals come back as deny Decisions;
    /// `Err` marks a broken caller contract or rule set.
    pub fn authorize(
        &self,
        principal: &Principal,
        action: &str,
        kind: &str,
        resource: Option<&dyn ResourceView>,
        parent: Option<&dyn ResourceView>,
    ) -> Result<Decision, AuthzError> {
        let decision = self.decide(principal, action, kind, resource, parent)?;
        if let Some(sink) = &self.audit {
            sink.record(&DecisionEvent {
                occurred_at: Utc::now(),
                principal_id: principal.id,
                principal_tenant: principal.tenant.clone(),
                action: action.to_string(),
                resource_kind: kind.to_string(),
                resource_id: resource.map(|r| r.id()),
                resource_tenant: resource.and_then(|r| r.tenant().cloned()),
                allowed: decision.allowed,
                reason: decision.reason,
            });
        }
        Ok(decision)
    }

    fn decide(
        &self,
        principal: &Principal,
        action: &str,
        kind: &str,
        resource: Option<&dyn ResourceView>,
        parent: Option<&dyn ResourceView>,
    ) -> Result<Decision, AuthzError> {
        if kind.is_empty() {
            return Err(AuthzError::UnknownResourceType {
                requested: String::new(),
                loaded: resource.map(|r| r.kind().to_string()).unwrap_or_default(),
            });
        }
        if let Some(r) = resource {
            if r.kind() != kind {
                return Err(AuthzError::UnknownResourceType {
                    requested: kind.to_string(),
                    loaded: r.kind().to_string(),
                });
            }
        }

        if !principal.active {
            return Ok(Decision::deny(Reason::PrincipalInactive));
        }

        let caps = resolver::resolve(principal);
        if caps.is_total() {
            return Ok(Decision::allow());
        }

        // Tenant isolation runs before any predicate. Creation checks have
        // no resource yet, so the guard falls back to the parent target.
        if let Some(target) = resource.or(parent) {
            if !same_tenant(principal, &caps, target) {
                return Ok(Decision::deny(Reason::TenantMismatch));
            }
        }

        let Some(rule) = self.table.lookup(kind, action) else {
            warn!(
                target: "authz",
                kind,
                action,
                "no rule registered, denying fail-closed"
            );
            return Ok(Decision::deny(Reason::NoRule));
        };

        let cx = EvalCx {
            principal,
            caps: &caps,
            kind,
            resource,
            parent,
        };
        match self.eval(rule, &cx, 0)? {
            Verdict::Pass => Ok(Decision::allow()),
            Verdict::Fail(reason) => Ok(Decision::deny(reason)),
        }
    }

    fn eval(&self, rule: &Rule, cx: &EvalCx<'_>, depth: usize) -> Result<Verdict, AuthzError> {
        match rule {
            Predicate::Always => Ok(Verdict::Pass),
            Predicate::Public => Ok(match cx.resource {
                Some(r) if r.is_public() => Verdict::Pass,
                _ => Verdict::Fail(Reason::MissingPermission),
            }),
            Predicate::HasAnyRole(roles) => Ok(if cx.caps.has_any_role(roles) {
                Verdict::Pass
            } else {
                Verdict::Fail(Reason::MissingRole)
            }),
            Predicate::HasPermission(permission) => Ok(if cx.caps.has_permission(permission) {
                Verdict::Pass
            } else {
                Verdict::Fail(Reason::MissingPermission)
            }),
            Predicate::IsOwner { field } => {
                Ok(match cx.resource.and_then(|r| r.actor_ref(field)) {
                    Some(owner) if owner == cx.principal.id => Verdict::Pass,
                    _ => Verdict::Fail(Reason::NotOwner),
                })
            }
            Predicate::IsAssignee { field } => {
                Ok(match cx.resource.and_then(|r| r.actor_ref(field)) {
                    Some(assignee) if assignee == cx.principal.id => Verdict::Pass,
                    _ => Verdict::Fail(Reason::NotAssignee),
                })
            }
            Predicate::StateNotIn(blocked) => Ok(match cx.resource {
                None => Verdict::Fail(Reason::ResourceStateBlocked),
                Some(r) => match r.state() {
                    Some(state) if blocked.iter().any(|b| b == state) => {
                        Verdict::Fail(Reason::ResourceStateBlocked)
                    }
                    _ => Verdict::Pass,
                },
            }),
            Predicate::Delegate { action } => {
                self.check_depth(cx.kind, action, depth)?;
                match self.table.lookup(cx.kind, action) {
                    None => {
                        warn!(
                            target: "authz",
                            kind = cx.kind,
                            action,
                            "delegation target has no rule, denying fail-closed"
                        );
                        Ok(Verdict::Fail(Reason::NoRule))
                    }
                    Some(delegated) => self.eval(delegated, cx, depth + 1),
                }
            }
            Predicate::Parent { action } => {
                self.check_depth(cx.kind, action, depth)?;
                let Some(parent) = cx.parent else {
                    return Ok(Verdict::Fail(Reason::MissingPermission));
                };
                if !same_tenant(cx.principal, cx.caps, parent) {
                    return Ok(Verdict::Fail(Reason::TenantMismatch));
                }
                match self.table.lookup(parent.kind(), action) {
                    None => {
                        warn!(
                            target: "authz",
                            kind = parent.kind(),
                            action,
                            "parent delegation target has no rule, denying fail-closed"
                        );
                        Ok(Verdict::Fail(Reason::NoRule))
                    }
                    Some(rule) => {
                        let parent_cx = EvalCx {
                            principal: cx.principal,
                            caps: cx.caps,
                            kind: parent.kind(),
                            resource: Some(parent),
                            parent: None,
                        };
                        self.eval(rule, &parent_cx, depth + 1)
                    }
                }
            }
            Predicate::All(clauses) => {
                for clause in clauses {
                    if let Verdict::Fail(reason) = self.eval(clause, cx, depth)? {
                        return Ok(Verdict::Fail(reason));
                    }
                }
                Ok(Verdict::Pass)
            }
            Predicate::Any(branches) => {
                let mut best: Option<Reason> = None;
                for branch in branches {
                    match self.eval(branch, cx, depth)? {
                        Verdict::Pass => return Ok(Verdict::Pass),
                        Verdict::Fail(reason) => {
                            let keep = match best {
                                Some(current) => reason.rank() > current.rank(),
                                None => true,
                            };
                            if keep {
                                best = Some(reason);
                            }
                        }
                    }
                }
                Ok(Verdict::Fail(best.unwrap_or(Reason::MissingRole)))
            }
            Predicate::Not { inner, reason } => Ok(match self.eval(inner, cx, depth)? {
                Verdict::Pass => Verdict::Fail(*reason),
                Verdict::Fail(_) => Verdict::Pass,
            }),
        }
    }

    fn check_depth(&self, kind: &str, action: &str, depth: usize) -> Result<(), AuthzError> {
        if depth >= MAX_DELEGATION_DEPTH {
            return Err(AuthzError::DelegationDepth {
                kind: kind.to_string(),
                action: action.to_string(),
                max: MAX_DELEGATION_DEPTH,
            });
        }
        Ok(())
    }
}

struct EvalCx<'a> {
    principal: &'a Principal,
    caps: &'a Capabilities,
    kind: &'a str,
    resource: Option<&'a dyn ResourceView>,
    parent: Option<&'a dyn ResourceView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use crate::resource::ResourceRecord;
    use crate::rule::{
        all_of, always, any_of, delegate, has_any_role, has_permission, is_assignee, is_owner,
        parent, public, state_not_in,
    };
    use crate::table::ResourceRules;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn engine() -> Engine {
        let table = RuleTable::builder()
            .resource(
                ResourceRules::new("change_request")
                    .blocked_states(&["approved"])
                    .action("approve", has_permission("projects.cost.approve")),
            )
            .resource(ResourceRules::new("contract")
                .managers(&[Role::Admin, Role::ProjectManager, Role::Accountant])
                .action("approve", has_permission("projects.cost.approve")))
            .resource(
                ResourceRules::new("task")
                    .action("assign", has_any_role(&[Role::Admin, Role::ProjectManager]))
                    .action("comment", delegate("view")),
            )
            .resource(ResourceRules::new("project").view(always()))
            .resource(
                ResourceRules::new("rfi")
                    .view(parent("view"))
                    .action("reply", delegate("view")),
            )
            .rule("report", "view", public().or(is_owner("created_by")))
            .rule("loop_a", "view", delegate("peek"))
            .rule("loop_a", "peek", delegate("view"))
            .build()
            .expect("static rules");
        Engine::new(table)
    }

    fn view(record: &ResourceRecord) -> Option<&dyn ResourceView> {
        Some(record)
    }

    #[test]
    fn owner_updates_own_draft() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let cr = ResourceRecord::new("change_request", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", user.id)
            .with_state("draft");
        let decision = engine
            .authorize(&user, "update", "change_request", view(&cr), None)
            .unwrap();
        assert_eq!(decision, Decision::allow());
    }

    #[test]
    fn cross_tenant_view_is_denied_before_rules() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        // Owner and admin role on paper, but the resource lives in t2.
        let user = user.with_roles(["admin"]);
        let cr = ResourceRecord::new("change_request", Uuid::new_v4())
            .in_tenant("t2")
            .actor("created_by", user.id);
        let decision = engine
            .authorize(&user, "view", "change_request", view(&cr), None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::TenantMismatch));
    }

    #[test]
    fn permission_grants_contract_approval() {
        let engine = engine();
        let approver = Principal::member_of("t1", Uuid::new_v4())
            .with_permissions(["projects.cost.approve"]);
        let contract = ResourceRecord::new("contract", Uuid::new_v4()).in_tenant("t1");
        let decision = engine
            .authorize(&approver, "approve", "contract", view(&contract), None)
            .unwrap();
        assert_eq!(decision, Decision::allow());
    }

    #[test]
    fn missing_permission_blocks_contract_approval() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let contract = ResourceRecord::new("contract", Uuid::new_v4()).in_tenant("t1");
        let decision = engine
            .authorize(&user, "approve", "contract", view(&contract), None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::MissingPermission));
    }

    #[test]
    fn super_admin_bypass_is_total() {
        let engine = engine();
        let root = Principal::super_admin(Uuid::new_v4());
        let cr = ResourceRecord::new("change_request", Uuid::new_v4())
            .in_tenant("t2")
            .with_state("approved");
        for action in ["view", "update", "delete", "approve", "force_delete"] {
            let decision = engine
                .authorize(&root, action, "change_request", view(&cr), None)
                .unwrap();
            assert_eq!(decision, Decision::allow(), "action {action}");
        }
    }

    #[test]
    fn unregistered_kind_denies_no_rule() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let decision = engine
            .authorize(&user, "publish", "widget_never_registered", None, None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::NoRule));
    }

    #[test]
    fn mismatched_resource_kind_is_a_contract_error() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let task = ResourceRecord::new("task", Uuid::new_v4()).in_tenant("t1");
        let err = engine
            .authorize(&user, "view", "contract", view(&task), None)
            .unwrap_err();
        match err {
            AuthzError::UnknownResourceType { requested, loaded } => {
                assert_eq!(requested, "contract");
                assert_eq!(loaded, "task");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inactive_principal_is_refused_before_bypass() {
        let engine = engine();
        let root = Principal::super_admin(Uuid::new_v4()).deactivated();
        let decision = engine
            .authorize(&root, "view", "task", None, None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::PrincipalInactive));
    }

    #[test]
    fn approved_change_request_blocks_creator_but_not_admin() {
        let engine = engine();
        let creator = Principal::member_of("t1", Uuid::new_v4());
        let admin = Principal::member_of("t1", Uuid::new_v4()).with_roles(["admin"]);
        let cr = ResourceRecord::new("change_request", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", creator.id)
            .with_state("approved");

        for action in ["update", "delete"] {
            let decision = engine
                .authorize(&creator, action, "change_request", view(&cr), None)
                .unwrap();
            assert_eq!(
                decision,
                Decision::deny(Reason::ResourceStateBlocked),
                "creator {action}"
            );
            let decision = engine
                .authorize(&admin, action, "change_request", view(&cr), None)
                .unwrap();
            assert_eq!(decision, Decision::allow(), "admin {action}");
        }
    }

    #[test]
    fn non_owner_without_role_reads_not_owner() {
        let engine = engine();
        let stranger = Principal::member_of("t1", Uuid::new_v4());
        let cr = ResourceRecord::new("change_request", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", Uuid::new_v4())
            .with_state("draft");
        let decision = engine
            .authorize(&stranger, "update", "change_request", view(&cr), None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::NotOwner));
    }

    #[test]
    fn restore_follows_the_update_rule() {
        let engine = engine();
        let owner = Principal::member_of("t1", Uuid::new_v4());
        let task = ResourceRecord::new("task", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", owner.id);
        let decision = engine
            .authorize(&owner, "restore", "task", view(&task), None)
            .unwrap();
        assert_eq!(decision, Decision::allow());
    }

    #[test]
    fn comment_delegates_to_view_on_same_resource() {
        let engine = engine();
        let owner = Principal::member_of("t1", Uuid::new_v4());
        let task = ResourceRecord::new("task", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", owner.id);
        let decision = engine
            .authorize(&owner, "comment", "task", view(&task), None)
            .unwrap();
        assert_eq!(decision, Decision::allow());
    }

    #[test]
    fn rfi_visibility_follows_the_parent_project() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let project_id = Uuid::new_v4();
        let project = ResourceRecord::new("project", project_id).in_tenant("t1");
        let rfi = ResourceRecord::new("rfi", Uuid::new_v4())
            .in_tenant("t1")
            .child_of("project", project_id);
        let decision = engine
            .authorize(&user, "view", "rfi", view(&rfi), view(&project))
            .unwrap();
        assert_eq!(decision, Decision::allow());

        // Reply chains through view, which chains through the parent.
        let decision = engine
            .authorize(&user, "reply", "rfi", view(&rfi), view(&project))
            .unwrap();
        assert_eq!(decision, Decision::allow());
    }

    #[test]
    fn parent_delegation_without_parent_fails_closed() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let rfi = ResourceRecord::new("rfi", Uuid::new_v4()).in_tenant("t1");
        let decision = engine
            .authorize(&user, "view", "rfi", view(&rfi), None)
            .unwrap();
        assert!(decision.is_deny());
    }

    #[test]
    fn delegation_cycles_error_out() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let looped = ResourceRecord::new("loop_a", Uuid::new_v4()).in_tenant("t1");
        let err = engine
            .authorize(&user, "view", "loop_a", view(&looped), None)
            .unwrap_err();
        match err {
            AuthzError::DelegationDepth { max, .. } => assert_eq!(max, MAX_DELEGATION_DEPTH),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn public_flag_opens_restricted_views() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let hidden = ResourceRecord::new("report", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", Uuid::new_v4());
        let published = hidden.clone().shared_publicly();
        assert!(
            engine
                .authorize(&user, "view", "report", view(&hidden), None)
                .unwrap()
                .is_deny()
        );
        assert!(
            engine
                .authorize(&user, "view", "report", view(&published), None)
                .unwrap()
                .is_allow()
        );
    }

    #[test]
    fn decisions_are_idempotent() {
        let engine = engine();
        let user = Principal::member_of("t1", Uuid::new_v4());
        let task = ResourceRecord::new("task", Uuid::new_v4())
            .in_tenant("t1")
            .actor("created_by", Uuid::new_v4());
        let first = engine
            .authorize(&user, "update", "task", view(&task), None)
            .unwrap();
        for _ in 0..5 {
            let again = engine
                .authorize(&user, "update", "task", view(&task), None)
                .unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn combinator_primitives_compose() {
        let table = RuleTable::builder()
            .rule(
                "inspection",
                "sign_off",
                all_of(vec![
                    is_assignee("inspector_id"),
                    state_not_in(&["closed"]),
                    any_of(vec![
                        has_any_role(&[Role::Engineer, Role::SiteManager]),
                        has_permission("inspections.sign"),
                    ]),
                ]),
            )
            .build()
            .expect("static rules");
        let engine = Engine::new(table);
        let inspector = Principal::member_of("t1", Uuid::new_v4()).with_roles(["engineer"]);
        let inspection = ResourceRecord::new("inspection", Uuid::new_v4())
            .in_tenant("t1")
            .actor("inspector_id", inspector.id)
            .with_state("open");
        let decision = engine
            .authorize(&inspector, "sign_off", "inspection", view(&inspection), None)
            .unwrap();
        assert_eq!(decision, Decision::allow());

        let other = Principal::member_of("t1", Uuid::new_v4()).with_roles(["engineer"]);
        let decision = engine
            .authorize(&other, "sign_off", "inspection", view(&inspection), None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::NotAssignee));
    }

    struct CapturingSink {
        events: Mutex<Vec<DecisionEvent>>,
    }

    impl AuditSink for CapturingSink {
        fn record(&self, event: &DecisionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn audit_sink_sees_every_decision() {
        let sink = Arc::new(CapturingSink {
            events: Mutex::new(Vec::new()),
        });
        let table = RuleTable::builder()
            .resource(ResourceRules::new("task"))
            .build()
            .expect("static rules");
        let engine = Engine::new(table).with_audit(sink.clone());

        let user = Principal::member_of("t1", Uuid::new_v4());
        let task = ResourceRecord::new("task", Uuid::new_v4())
            .in_tenant("t2")
            .actor("created_by", user.id);
        let decision = engine
            .authorize(&user, "update", "task", view(&task), None)
            .unwrap();
        assert_eq!(decision, Decision::deny(Reason::TenantMismatch));

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].decision(), decision);
        assert_eq!(events[0].action, "update");
        assert_eq!(events[0].resource_kind, "task");
    }
}
