use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable reason attached to every [`Decision`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    Ok,
    PrincipalInactive,
    TenantMismatch,
    MissingPermission,
    MissingRole,
    NotOwner,
    NotAssignee,
    ResourceStateBlocked,
    NoRule,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Ok => "OK",
            Reason::PrincipalInactive => "PRINCIPAL_INACTIVE",
            Reason::TenantMismatch => "TENANT_MISMATCH",
            Reason::MissingPermission => "MISSING_PERMISSION",
            Reason::MissingRole => "MISSING_ROLE",
            Reason::NotOwner => "NOT_OWNER",
            Reason::NotAssignee => "NOT_ASSIGNEE",
            Reason::ResourceStateBlocked => "RESOURCE_STATE_BLOCKED",
            Reason::NoRule => "NO_RULE",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "OK" => Some(Reason::Ok),
            "PRINCIPAL_INACTIVE" => Some(Reason::PrincipalInactive),
            "TENANT_MISMATCH" => Some(Reason::TenantMismatch),
            "MISSING_PERMISSION" => Some(Reason::MissingPermission),
            "MISSING_ROLE" => Some(Reason::MissingRole),
            "NOT_OWNER" => Some(Reason::NotOwner),
            "NOT_ASSIGNEE" => Some(Reason::NotAssignee),
            "RESOURCE_STATE_BLOCKED" => Some(Reason::ResourceStateBlocked),
            "NO_RULE" => Some(Reason::NoRule),
            _ => None,
        }
    }

    /// Specificity used when an ANY combinator has to pick which branch
    /// denial to surface. Higher wins.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Reason::TenantMismatch => 6,
            Reason::ResourceStateBlocked => 5,
            Reason::NotOwner => 4,
            Reason::NotAssignee => 3,
            Reason::MissingPermission => 2,
            Reason::MissingRole => 1,
            Reason::Ok | Reason::PrincipalInactive | Reason::NoRule => 0,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one authorization call. Pure data, safe to log or serialize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Reason,
}

impl Decision {
    pub const fn allow() -> Self {
        Decision {
            allowed: true,
            reason: Reason::Ok,
        }
    }

    pub const fn deny(reason: Reason) -> Self {
        Decision {
            allowed: false,
            reason,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.allowed
    }

    pub fn is_deny(&self) -> bool {
        !self.allowed
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allowed {
            write!(f, "allow({})", self.reason)
        } else {
            write!(f, "deny({})", self.reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_round_trip() {
        for reason in [
            Reason::Ok,
            Reason::PrincipalInactive,
            Reason::TenantMismatch,
            Reason::MissingPermission,
            Reason::MissingRole,
            Reason::NotOwner,
            Reason::NotAssignee,
            Reason::ResourceStateBlocked,
            Reason::NoRule,
        ] {
            assert_eq!(Reason::from_str(reason.as_str()), Some(reason));
        }
        assert_eq!(Reason::from_str("NOPE"), None);
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&Decision::deny(Reason::TenantMismatch)).unwrap();
        assert_eq!(json, r#"{"allowed":false,"reason":"TENANT_MISMATCH"}"#);
    }

    #[test]
    fn allow_always_carries_ok() {
        let d = Decision::allow();
        assert!(d.is_allow());
        assert_eq!(d.reason, Reason::Ok);
    }
}
