use chrono::{DateTime, NaiveDate, Utc};
use platform_authz::{ResourceRecord, ResourceView, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Model {
    pub id: Uuid,
    pub tenant: TenantId,
    pub project_id: Uuid,
    pub log_date: NaiveDate,
    pub weather: Option<String>,
    pub crew_count: i32,
    pub notes_md: Option<String>,
    pub logged_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ResourceView for Model {
    fn kind(&self) -> &str {
        "daily_log"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        Some(&self.tenant)
    }

    fn actor_ref(&self, field: &str) -> Option<Uuid> {
        match field {
            "logged_by" => Some(self.logged_by),
            _ => None,
        }
    }
}

impl From<&Model> for ResourceRecord {
    fn from(model: &Model) -> Self {
        ResourceRecord::new("daily_log", model.id)
            .in_tenant(model.tenant.clone())
            .actor("logged_by", model.logged_by)
            .child_of("project", model.project_id)
    }
}
