use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::principal::TenantId;

/// Read-only view over an already-loaded domain object.
///
/// The evaluator never fetches anything; callers load the resource (and its
/// parent, for nested checks) and hand in snapshots through this trait.
/// `actor_ref` resolves id-valued fields by name so each resource type can
/// keep its own owner column (`created_by`, `uploaded_by`, `inspector_id`,
/// `invited_by`, ...).
pub trait ResourceView {
    fn kind(&self) -> &str;

    fn id(&self) -> Uuid;

    /// `None` marks a global resource shared across tenants.
    fn tenant(&self) -> Option<&TenantId>;

    fn actor_ref(&self, field: &str) -> Option<Uuid>;

    /// Lifecycle state, when the type has one ("draft", "approved", ...).
    fn state(&self) -> Option<&str> {
        None
    }

    fn is_public(&self) -> bool {
        false
    }
}

/// Reference to another resource, carried by records that belong to a
/// parent (task -> project, budget line -> budget).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceRef {
    pub kind: String,
    pub id: Uuid,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, id: Uuid) -> Self {
        ResourceRef {
            kind: kind.into(),
            id,
        }
    }
}

/// Untyped resource snapshot. Domain crates implement [`ResourceView`] on
/// their own models; this record covers fixtures, tests, and callers that
/// only hold loosely-shaped rows.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResourceRecord {
    pub kind: String,
    pub id: Uuid,
    pub tenant: Option<TenantId>,
    pub actor_refs: BTreeMap<String, Uuid>,
    pub state: Option<String>,
    pub public: bool,
    pub parent: Option<ResourceRef>,
}

impl ResourceRecord {
    pub fn new(kind: impl Into<String>, id: Uuid) -> Self {
        ResourceRecord {
            kind: kind.into(),
            id,
            tenant: None,
            actor_refs: BTreeMap::new(),
            state: None,
            public: false,
            parent: None,
        }
    }

    pub fn in_tenant(mut self, tenant: impl Into<TenantId>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn actor(mut self, field: impl Into<String>, id: Uuid) -> Self {
        self.actor_refs.insert(field.into(), id);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn shared_publicly(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn child_of(mut self, kind: impl Into<String>, id: Uuid) -> Self {
        self.parent = Some(ResourceRef::new(kind, id));
        self
    }
}

impl ResourceView for ResourceRecord {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    fn actor_ref(&self, field: &str) -> Option<Uuid> {
        self.actor_refs.get(field).copied()
    }

    fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn is_public(&self) -> bool {
        self.public
    }
}
