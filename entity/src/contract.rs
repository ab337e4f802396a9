use chrono::{DateTime, Utc};
use platform_authz::{ResourceRecord, ResourceView, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Model {
    pub id: Uuid,
    pub tenant: TenantId,
    pub project_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub title: String,
    pub value_cents: i64,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Sent,
    Executed,
    Terminated,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Sent => "sent",
            Status::Executed => "executed",
            Status::Terminated => "terminated",
        }
    }
}

impl ResourceView for Model {
    fn kind(&self) -> &str {
        "contract"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        Some(&self.tenant)
    }

    fn actor_ref(&self, field: &str) -> Option<Uuid> {
        match field {
            "created_by" => Some(self.created_by),
            _ => None,
        }
    }

    fn state(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl From<&Model> for ResourceRecord {
    fn from(model: &Model) -> Self {
        ResourceRecord::new("contract", model.id)
            .in_tenant(model.tenant.clone())
            .actor("created_by", model.created_by)
            .with_state(model.status.as_str())
            .child_of("project", model.project_id)
    }
}
