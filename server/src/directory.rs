use std::collections::HashMap;

use chrono::{Duration, Utc};
use entity::{
    change_request, contract, daily_log, document, inspection, invitation, payment, project, rfi,
    task,
};
use platform_authz::ResourceRecord;
use uuid::Uuid;

/// In-memory resource snapshots, a demo stand-in for the suite's loaders.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    records: HashMap<(String, Uuid), ResourceRecord>,
}

impl Directory {
    pub fn insert(&mut self, record: ResourceRecord) {
        self.records
            .insert((record.kind.clone(), record.id), record);
    }

    pub fn get(&self, kind: &str, id: Uuid) -> Option<&ResourceRecord> {
        self.records.get(&(kind.to_string(), id))
    }

    /// Resolve the parent snapshot referenced by `record`, if loaded.
    pub fn parent_of(&self, record: &ResourceRecord) -> Option<&ResourceRecord> {
        let parent = record.parent.as_ref()?;
        self.get(&parent.kind, parent.id)
    }

    pub fn list(&self, kind: &str) -> Vec<&ResourceRecord> {
        let mut records: Vec<_> = self.records.values().filter(|r| r.kind == kind).collect();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fixed fixture ids so demo tokens and curl examples line up run to run.
pub mod fixtures {
    use uuid::Uuid;

    pub const TENANT_ALPHA: &str = "alpha";
    pub const TENANT_BETA: &str = "beta";

    pub const CAROL_PM: Uuid = Uuid::from_u128(0xC0);
    pub const DAN_ENGINEER: Uuid = Uuid::from_u128(0xDA);
    pub const ERIN_ACCOUNTANT: Uuid = Uuid::from_u128(0xE0);
    pub const FRANK_MEMBER: Uuid = Uuid::from_u128(0xF0);

    pub const PROJECT_ALPHA: Uuid = Uuid::from_u128(0x1001);
    pub const PROJECT_BETA: Uuid = Uuid::from_u128(0x1002);
    pub const TASK_FOOTINGS: Uuid = Uuid::from_u128(0x2001);
    pub const DOC_SITE_PLAN: Uuid = Uuid::from_u128(0x3001);
    pub const DOC_TEMPLATE: Uuid = Uuid::from_u128(0x3002);
    pub const CONTRACT_STEEL: Uuid = Uuid::from_u128(0x4001);
    pub const CHANGE_REQUEST_REBAR: Uuid = Uuid::from_u128(0x4101);
    pub const PAYMENT_FIRST: Uuid = Uuid::from_u128(0x4201);
    pub const RFI_GRADING: Uuid = Uuid::from_u128(0x5001);
    pub const INSPECTION_SLAB: Uuid = Uuid::from_u128(0x5101);
    pub const INVITATION_SUB: Uuid = Uuid::from_u128(0x6001);
    pub const DAILY_LOG_FIRST: Uuid = Uuid::from_u128(0x7001);
}

/// Seed two tenants worth of fixtures through the entity conversions.
pub fn demo_directory() -> Directory {
    use fixtures::*;

    let now = Utc::now();
    let mut directory = Directory::default();

    directory.insert(ResourceRecord::from(&project::Model {
        id: PROJECT_ALPHA,
        tenant: TENANT_ALPHA.into(),
        code: "RT-100".to_string(),
        name: "Riverside Tower".to_string(),
        status: project::Status::Active,
        created_by: CAROL_PM,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&project::Model {
        id: PROJECT_BETA,
        tenant: TENANT_BETA.into(),
        code: "HL-7".to_string(),
        name: "Hillside Lofts".to_string(),
        status: project::Status::Planning,
        created_by: FRANK_MEMBER,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&task::Model {
        id: TASK_FOOTINGS,
        tenant: TENANT_ALPHA.into(),
        project_id: PROJECT_ALPHA,
        title: "Pour footings, gridline B".to_string(),
        notes_md: None,
        status: task::Status::Open,
        assigned_to: Some(DAN_ENGINEER),
        created_by: CAROL_PM,
        due_at: None,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&document::Model {
        id: DOC_SITE_PLAN,
        tenant: Some(TENANT_ALPHA.into()),
        project_id: Some(PROJECT_ALPHA),
        file_name: "site-plan-r3.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        size_bytes: 4_518_344,
        version: 3,
        public: false,
        uploaded_by: DAN_ENGINEER,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&document::Model {
        id: DOC_TEMPLATE,
        tenant: None,
        project_id: None,
        file_name: "daily-log-template.xlsx".to_string(),
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            .to_string(),
        size_bytes: 28_412,
        version: 1,
        public: true,
        uploaded_by: CAROL_PM,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&contract::Model {
        id: CONTRACT_STEEL,
        tenant: TENANT_ALPHA.into(),
        project_id: PROJECT_ALPHA,
        vendor_id: None,
        title: "Structural steel package".to_string(),
        value_cents: 84_500_000,
        status: contract::Status::Draft,
        created_by: ERIN_ACCOUNTANT,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&change_request::Model {
        id: CHANGE_REQUEST_REBAR,
        tenant: TENANT_ALPHA.into(),
        project_id: PROJECT_ALPHA,
        title: "Extra rebar, level 2 slab".to_string(),
        cost_delta_cents: 250_000,
        status: change_request::Status::Approved,
        created_by: DAN_ENGINEER,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&payment::Model {
        id: PAYMENT_FIRST,
        tenant: TENANT_ALPHA.into(),
        contract_id: CONTRACT_STEEL,
        amount_cents: 12_000_000,
        reference: "PAY-0001".to_string(),
        status: payment::Status::Pending,
        created_by: ERIN_ACCOUNTANT,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&rfi::Model {
        id: RFI_GRADING,
        tenant: TENANT_ALPHA.into(),
        project_id: PROJECT_ALPHA,
        number: 12,
        subject: "Grading at east retaining wall".to_string(),
        question_md: "Drawing C-301 disagrees with the soils report.".to_string(),
        status: rfi::Status::Open,
        assigned_to: Some(CAROL_PM),
        created_by: DAN_ENGINEER,
        due_at: None,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&inspection::Model {
        id: INSPECTION_SLAB,
        tenant: TENANT_ALPHA.into(),
        project_id: PROJECT_ALPHA,
        title: "Level 1 slab pre-pour".to_string(),
        status: inspection::Status::Scheduled,
        inspector_id: Some(DAN_ENGINEER),
        scheduled_for: Some(now + Duration::days(2)),
        created_by: CAROL_PM,
        created_at: now,
        updated_at: now,
    }));
    directory.insert(ResourceRecord::from(&invitation::Model {
        id: INVITATION_SUB,
        tenant: TENANT_ALPHA.into(),
        email: "ops@meridianelectric.example".to_string(),
        role: "subcontractor".to_string(),
        status: invitation::Status::Pending,
        invited_by: CAROL_PM,
        invitee_id: None,
        expires_at: now + Duration::days(7),
        created_at: now,
    }));
    directory.insert(ResourceRecord::from(&daily_log::Model {
        id: DAILY_LOG_FIRST,
        tenant: TENANT_ALPHA.into(),
        project_id: PROJECT_ALPHA,
        log_date: now.date_naive(),
        weather: Some("overcast, 14C".to_string()),
        crew_count: 23,
        notes_md: Some("Footings poured at gridline B.".to_string()),
        logged_by: DAN_ENGINEER,
        created_at: now,
    }));

    directory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_records_resolve_by_kind_and_id() {
        let directory = demo_directory();
        assert!(!directory.is_empty());
        let task = directory.get("task", fixtures::TASK_FOOTINGS).unwrap();
        assert_eq!(task.state.as_deref(), Some("open"));
        assert!(directory.get("task", fixtures::PROJECT_ALPHA).is_none());
    }

    #[test]
    fn parents_resolve_through_the_directory() {
        let directory = demo_directory();
        let payment = directory.get("payment", fixtures::PAYMENT_FIRST).unwrap();
        let contract = directory.parent_of(payment).unwrap();
        assert_eq!(contract.kind, "contract");
        assert_eq!(contract.id, fixtures::CONTRACT_STEEL);
    }

    #[test]
    fn listing_filters_by_kind() {
        let directory = demo_directory();
        let projects = directory.list("project");
        assert_eq!(projects.len(), 2);
        assert!(projects.iter().all(|r| r.kind == "project"));
    }
}
