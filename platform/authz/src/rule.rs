use serde::Serialize;

use crate::decision::Reason;
use crate::principal::Role;

/// Predicate tree evaluated against (principal, resource?, parent?).
///
/// Rules are data: built once at startup from these constructors, stored in
/// the table, and walked by the evaluator. Serialization exists so the
/// registered matrix can be dumped for inspection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Passes unconditionally. Tenant isolation still applies first.
    Always,
    /// Passes when the resource is flagged public.
    Public,
    HasAnyRole(Vec<Role>),
    HasPermission(String),
    /// Principal id equals the named id field on the resource.
    IsOwner { field: String },
    IsAssignee { field: String },
    /// Fails while the resource state is one of the listed values.
    StateNotIn(Vec<String>),
    /// Re-evaluates another action's rule on the same resource.
    Delegate { action: String },
    /// Evaluates an action's rule on the supplied parent resource.
    Parent { action: String },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not { inner: Box<Predicate>, reason: Reason },
}

/// A registered rule is a predicate; the alias keeps call sites honest
/// about which one they mean.
pub type Rule = Predicate;

pub fn always() -> Predicate {
    Predicate::Always
}

pub fn public() -> Predicate {
    Predicate::Public
}

pub fn has_role(role: Role) -> Predicate {
    Predicate::HasAnyRole(vec![role])
}

pub fn has_any_role(roles: &[Role]) -> Predicate {
    Predicate::HasAnyRole(roles.to_vec())
}

pub fn has_permission(permission: impl Into<String>) -> Predicate {
    Predicate::HasPermission(permission.into())
}

pub fn is_owner(field: impl Into<String>) -> Predicate {
    Predicate::IsOwner {
        field: field.into(),
    }
}

pub fn is_assignee(field: impl Into<String>) -> Predicate {
    Predicate::IsAssignee {
        field: field.into(),
    }
}

pub fn state_not_in(states: &[&str]) -> Predicate {
    Predicate::StateNotIn(states.iter().map(|s| (*s).to_string()).collect())
}

pub fn delegate(action: impl Into<String>) -> Predicate {
    Predicate::Delegate {
        action: action.into(),
    }
}

pub fn parent(action: impl Into<String>) -> Predicate {
    Predicate::Parent {
        action: action.into(),
    }
}

pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::All(predicates)
}

pub fn any_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::Any(predicates)
}

pub fn not(inner: Predicate, reason: Reason) -> Predicate {
    Predicate::Not {
        inner: Box::new(inner),
        reason,
    }
}

impl Predicate {
    /// `self AND other`, flattening nested ALLs.
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::All(mut clauses) => {
                clauses.push(other);
                Predicate::All(clauses)
            }
            first => Predicate::All(vec![first, other]),
        }
    }

    /// `self OR other`, flattening nested ANYs.
    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Any(mut branches) => {
                branches.push(other);
                Predicate::Any(branches)
            }
            first => Predicate::Any(vec![first, other]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_or_flatten() {
        let p = is_owner("created_by")
            .and(state_not_in(&["approved"]))
            .and(has_role(Role::Member));
        match p {
            Predicate::All(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("expected All, got {other:?}"),
        }

        let q = public().or(is_owner("created_by")).or(has_role(Role::Admin));
        match q {
            Predicate::Any(branches) => assert_eq!(branches.len(), 3),
            other => panic!("expected Any, got {other:?}"),
        }
    }

    #[test]
    fn rules_serialize_for_inspection() {
        let rule = is_owner("created_by").or(has_any_role(&[Role::Admin, Role::ProjectManager]));
        let json = serde_json::to_value(&rule).unwrap();
        assert!(json.get("any").is_some());
    }
}
