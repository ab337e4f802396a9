use chrono::{DateTime, Utc};
use platform_authz::{ResourceRecord, ResourceView, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uploaded file metadata. `tenant: None` marks a platform-wide template
/// document shared across tenants.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Model {
    pub id: Uuid,
    pub tenant: Option<TenantId>,
    pub project_id: Option<Uuid>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub version: i32,
    pub public: bool,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceView for Model {
    fn kind(&self) -> &str {
        "document"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    fn actor_ref(&self, field: &str) -> Option<Uuid> {
        match field {
            "uploaded_by" => Some(self.uploaded_by),
            _ => None,
        }
    }

    fn is_public(&self) -> bool {
        self.public
    }
}

impl From<&Model> for ResourceRecord {
    fn from(model: &Model) -> Self {
        let mut record = ResourceRecord::new("document", model.id)
            .actor("uploaded_by", model.uploaded_by);
        if let Some(tenant) = &model.tenant {
            record = record.in_tenant(tenant.clone());
        }
        if let Some(project_id) = model.project_id {
            record = record.child_of("project", project_id);
        }
        if model.public {
            record = record.shared_publicly();
        }
        record
    }
}
