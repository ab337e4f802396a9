use std::collections::BTreeSet;

use serde::Serialize;

use crate::principal::{Principal, Role};

/// The wildcard permission token. Holding it is a total grant.
pub const WILDCARD_PERMISSION: &str = "*";

/// Effective capability set for one principal, computed once per
/// authorization call and then only read.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Capabilities {
    pub roles: BTreeSet<Role>,
    pub permissions: BTreeSet<String>,
}

impl Capabilities {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }

    /// Literal membership check. The `*` wildcard is handled once by the
    /// evaluator's bypass, not re-derived here.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// True when every check passes unconditionally: the `super_admin`
    /// role or the `*` permission.
    pub fn is_total(&self) -> bool {
        self.roles.contains(&Role::SuperAdmin) || self.permissions.contains(WILDCARD_PERMISSION)
    }
}

/// Maps a principal to its effective roles and permissions.
///
/// Unknown role strings are skipped, absent sets resolve to empty sets.
/// Role-implied permission grants are expanded additively and must stay
/// conservative: a role only implies permissions its holders always have.
pub fn resolve(principal: &Principal) -> Capabilities {
    let roles: BTreeSet<Role> = principal
        .roles
        .iter()
        .filter_map(|name| Role::from_str(name.trim()))
        .collect();

    let mut permissions: BTreeSet<String> = principal
        .permissions
        .iter()
        .map(|perm| perm.trim().to_string())
        .filter(|perm| !perm.is_empty())
        .collect();

    for role in &roles {
        for grant in implied_grants(*role) {
            permissions.insert((*grant).to_string());
        }
    }

    Capabilities { roles, permissions }
}

fn implied_grants(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => &[
            "projects.close",
            "projects.cost.approve",
            "projects.cost.view",
            "documents.share",
            "reports.export",
        ],
        Role::ProjectManager => &["projects.close", "documents.share", "reports.export"],
        Role::Accountant => &["projects.cost.view", "projects.cost.approve"],
        Role::Engineer => &["documents.share"],
        _ => &[],
    }
}
