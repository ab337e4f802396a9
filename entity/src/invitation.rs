use chrono::{DateTime, Utc};
use platform_authz::{ResourceRecord, ResourceView, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pending invite into a tenant. `invitee_id` is set once the invited
/// address maps to a known account; acceptance is gated on that link.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Model {
    pub id: Uuid,
    pub tenant: TenantId,
    pub email: String,
    pub role: String,
    pub status: Status,
    pub invited_by: Uuid,
    pub invitee_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Accepted => "accepted",
            Status::Declined => "declined",
            Status::Expired => "expired",
        }
    }
}

impl ResourceView for Model {
    fn kind(&self) -> &str {
        "invitation"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        Some(&self.tenant)
    }

    fn actor_ref(&self, field: &str) -> Option<Uuid> {
        match field {
            "invited_by" => Some(self.invited_by),
            "invitee_id" => self.invitee_id,
            _ => None,
        }
    }

    fn state(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl From<&Model> for ResourceRecord {
    fn from(model: &Model) -> Self {
        let record = ResourceRecord::new("invitation", model.id)
            .in_tenant(model.tenant.clone())
            .actor("invited_by", model.invited_by)
            .with_state(model.status.as_str());
        match model.invitee_id {
            Some(invitee) => record.actor("invitee_id", invitee),
            None => record,
        }
    }
}
