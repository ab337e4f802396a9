use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical tenant identifier.
///
/// Tenant ids reach us in more than one textual form (uuid with or without
/// hyphens, mixed case, stray whitespace). Canonicalizing once at
/// construction means equality is plain string equality everywhere else.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if let Ok(uuid) = Uuid::parse_str(trimmed) {
            return TenantId(uuid.as_hyphenated().to_string());
        }
        TenantId(trimmed.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(raw: &str) -> Self {
        TenantId::new(raw)
    }
}

impl From<String> for TenantId {
    fn from(raw: String) -> Self {
        TenantId::new(raw)
    }
}

impl From<Uuid> for TenantId {
    fn from(raw: Uuid) -> Self {
        TenantId(raw.as_hyphenated().to_string())
    }
}

/// Closed role vocabulary. Unknown role strings coming from the identity
/// store are skipped during resolution, never errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    ProjectManager,
    SiteManager,
    Engineer,
    Accountant,
    Foreman,
    Subcontractor,
    Client,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::ProjectManager => "project_manager",
            Role::SiteManager => "site_manager",
            Role::Engineer => "engineer",
            Role::Accountant => "accountant",
            Role::Foreman => "foreman",
            Role::Subcontractor => "subcontractor",
            Role::Client => "client",
            Role::Member => "member",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "project_manager" => Some(Role::ProjectManager),
            "site_manager" => Some(Role::SiteManager),
            "engineer" => Some(Role::Engineer),
            "accountant" => Some(Role::Accountant),
            "foreman" => Some(Role::Foreman),
            "subcontractor" => Some(Role::Subcontractor),
            "client" => Some(Role::Client),
            "member" => Some(Role::Member),
            _ => None,
        }
    }

    /// Coarse privilege ordering, highest first. Only used for display and
    /// sorting; authorization itself goes through rules.
    pub fn level(&self) -> u8 {
        match self {
            Role::SuperAdmin => 100,
            Role::Admin => 90,
            Role::ProjectManager => 70,
            Role::SiteManager => 60,
            Role::Engineer => 50,
            Role::Accountant => 50,
            Role::Foreman => 40,
            Role::Subcontractor => 30,
            Role::Client => 20,
            Role::Member => 10,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting entity, as loaded by the identity subsystem. `tenant: None`
/// marks a platform-scoped principal; combined with the `super_admin` role
/// (or the `*` permission) it may cross tenant boundaries.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub tenant: Option<TenantId>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub active: bool,
}

impl Principal {
    /// A regular tenant member with no roles or permissions yet.
    pub fn member_of(tenant: impl Into<TenantId>, id: Uuid) -> Self {
        Principal {
            id,
            tenant: Some(tenant.into()),
            roles: Vec::new(),
            permissions: Vec::new(),
            active: true,
        }
    }

    /// The platform super-admin sentinel: null tenant plus the
    /// `super_admin` role.
    pub fn super_admin(id: Uuid) -> Self {
        Principal {
            id,
            tenant: None,
            roles: vec![Role::SuperAdmin.as_str().to_string()],
            permissions: Vec::new(),
            active: true,
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}
