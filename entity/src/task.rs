use chrono::{DateTime, Utc};
use platform_authz::{ResourceRecord, ResourceView, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Model {
    pub id: Uuid,
    pub tenant: TenantId,
    pub project_id: Uuid,
    pub title: String,
    pub notes_md: Option<String>,
    pub status: Status,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Done,
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Cancelled => "cancelled",
        }
    }
}

impl ResourceView for Model {
    fn kind(&self) -> &str {
        "task"
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
            "assigned_to" => self.assigned_to,
            _ => None,
        }
    }

    fn state(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl From<&Model> for ResourceRecord {
    fn from(model: &Model) -> Self {
        let record = ResourceRecord::new("task", model.id)
            .in_tenant(model.tenant.clone())
            .actor("created_by", model.created_by)
            .with_state(model.status.as_str())
            .child_of("project", model.project_id);
        match model.assigned_to {
            Some(assignee) => record.actor("assigned_to", assignee),
            None => record,
        }
    }
}
