use chrono::{DateTime, Utc};
use platform_authz::{ResourceRecord, ResourceView, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Change order raised against a project. Once approved it is locked for
/// its creator; only the manager roles may touch it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Model {
    pub id: Uuid,
    pub tenant: TenantId,
    pub project_id: Uuid,
    pub title: String,
    pub cost_delta_cents: i64,
    pub status: Status,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Submitted => "submitted",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }
}

impl ResourceView for Model {
    fn kind(&self) -> &str {
        "change_request"
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
        ResourceRecord::new("change_request", model.id)
            .in_tenant(model.tenant.clone())
            .actor("created_by", model.created_by)
            .with_state(model.status.as_str())
            .child_of("project", model.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_status_reads_back_as_state() {
        let model = Model {
            id: Uuid::new_v4(),
            tenant: TenantId::new("acme"),
            project_id: Uuid::new_v4(),
            title: "Extra rebar".to_string(),
            cost_delta_cents: 250_000,
            status: Status::Approved,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(model.state(), Some("approved"));
    }
}
