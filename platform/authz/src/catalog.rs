use crate::error::AuthzError;
use crate::principal::Role;
use crate::rule::{
    always, any_of, delegate, has_any_role, has_permission, has_role, is_assignee, is_owner,
    parent, public,
};
use crate::table::{ResourceRules, RuleTable, RuleTableBuilder};

/// Registers the full Sitedesk resource catalog.
///
/// One registration block per resource kind, grouped the way the product
/// is organized. Owner fields, manager roles, and workflow actions vary
/// per kind; the template supplies the shared CRUD shape.
pub fn sitedesk_rules() -> Result<RuleTable, AuthzError> {
    let builder = RuleTable::builder();
    let builder = core_rules(builder);
    let builder = document_rules(builder);
    let builder = field_rules(builder);
    let builder = commercial_rules(builder);
    let builder = planning_rules(builder);
    builder.build()
}

fn core_rules(builder: RuleTableBuilder) -> RuleTableBuilder {
    builder
        .resource(
            ResourceRules::new("project")
                .view(always())
                .create(has_any_role(&[Role::Admin, Role::ProjectManager]))
                .action("close", has_permission("projects.close"))
                .admin_restore()
                .admin_force_delete(),
        )
        .resource(
            ResourceRules::new("team")
                .view(always())
                .create(has_role(Role::Admin))
                .update(has_role(Role::Admin))
                .delete(has_role(Role::Admin))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("team_member")
                .view(always())
                .create(has_any_role(&[Role::Admin, Role::ProjectManager]))
                .delete(any_of(vec![
                    is_assignee("member_id"),
                    has_any_role(&[Role::Admin, Role::ProjectManager]),
                ]))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("invitation")
                .owner("invited_by")
                .view(any_of(vec![
                    is_owner("invited_by"),
                    has_any_role(&[Role::Admin, Role::ProjectManager]),
                ]))
                .create(has_any_role(&[Role::Admin, Role::ProjectManager]))
                .action("accept", is_assignee("invitee_id"))
                .action("decline", is_assignee("invitee_id"))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("vendor")
                .view(always())
                .create(has_any_role(&[Role::Admin, Role::ProjectManager, Role::Accountant]))
                .managers(&[Role::Admin, Role::ProjectManager, Role::Accountant]),
        )
        .resource(
            ResourceRules::new("subcontract")
                .view(any_of(vec![
                    is_owner("created_by"),
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Accountant]),
                ]))
                .managers(&[Role::Admin, Role::ProjectManager, Role::Accountant]),
        )
}

fn document_rules(builder: RuleTableBuilder) -> RuleTableBuilder {
    builder
        .resource(
            ResourceRules::new("document")
                .owner("uploaded_by")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager, Role::Engineer])
                .action("share", has_permission("documents.share"))
                .action("comment", delegate("view"))
                .admin_force_delete(),
        )
        .resource(
            ResourceRules::new("document_folder")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager]),
        )
        .resource(
            ResourceRules::new("drawing")
                .owner("uploaded_by")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager, Role::Engineer])
                .admin_force_delete(),
        )
        .resource(
            ResourceRules::new("drawing_revision")
                .owner("uploaded_by")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager, Role::Engineer])
                .action(
                    "publish",
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Engineer]),
                ),
        )
        .resource(
            ResourceRules::new("specification")
                .owner("uploaded_by")
                .view(any_of(vec![
                    public(),
                    is_owner("uploaded_by"),
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Engineer]),
                ]))
                .managers(&[Role::Admin, Role::ProjectManager, Role::Engineer]),
        )
        .resource(
            ResourceRules::new("submittal")
                .blocked_states(&["approved"])
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager, Role::Engineer])
                .action("submit", is_owner("created_by"))
                .action(
                    "approve",
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Engineer]),
                ),
        )
}

fn field_rules(builder: RuleTableBuilder) -> RuleTableBuilder {
    let site_roles = [Role::Admin, Role::ProjectManager, Role::SiteManager];
    builder
        .resource(
            ResourceRules::new("task")
                .view(always())
                .managers(&site_roles)
                .update(any_of(vec![
                    is_owner("created_by"),
                    is_assignee("assigned_to"),
                    has_any_role(&site_roles),
                ]))
                .action("assign", has_any_role(&site_roles))
                .action(
                    "complete",
                    any_of(vec![is_assignee("assigned_to"), has_any_role(&site_roles)]),
                )
                .action("comment", delegate("view")),
        )
        .resource(
            ResourceRules::new("task_comment")
                .view(parent("view"))
                .create(parent("view"))
                .update(is_owner("created_by"))
                .delete(any_of(vec![
                    is_owner("created_by"),
                    has_any_role(&[Role::Admin, Role::ProjectManager]),
                ]))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("rfi")
                .blocked_states(&["closed"])
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager, Role::Engineer])
                .action(
                    "assign",
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Engineer]),
                )
                .action(
                    "close",
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Engineer]),
                )
                .action("reply", delegate("view")),
        )
        .resource(
            ResourceRules::new("rfi_reply")
                .view(parent("view"))
                .create(parent("view"))
                .update(is_owner("created_by"))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("inspection")
                .owner("inspector_id")
                .view(always())
                .managers(&site_roles)
                .action("assign", has_any_role(&site_roles)),
        )
        .resource(
            ResourceRules::new("inspection_item")
                .owner("inspector_id")
                .view(parent("view"))
                .create(parent("update"))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("punch_item")
                .view(always())
                .managers(&site_roles)
                .action("assign", has_any_role(&site_roles))
                .action(
                    "close",
                    any_of(vec![is_assignee("assigned_to"), has_any_role(&site_roles)]),
                ),
        )
        .resource(
            ResourceRules::new("daily_log")
                .owner("logged_by")
                .view(always())
                .managers(&site_roles),
        )
        .resource(
            ResourceRules::new("meeting_minute")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager]),
        )
        .resource(
            ResourceRules::new("safety_incident")
                .owner("reported_by")
                .view(always())
                .managers(&[Role::Admin, Role::SiteManager]),
        )
}

fn commercial_rules(builder: RuleTableBuilder) -> RuleTableBuilder {
    let cost_roles = [Role::Admin, Role::ProjectManager, Role::Accountant];
    builder
        .resource(
            ResourceRules::new("contract")
                .blocked_states(&["executed"])
                .view(any_of(vec![is_owner("created_by"), has_any_role(&cost_roles)]))
                .managers(&cost_roles)
                .action("approve", has_permission("projects.cost.approve"))
                .admin_force_delete(),
        )
        .resource(
            ResourceRules::new("change_request")
                .blocked_states(&["approved"])
                .view(any_of(vec![
                    is_owner("created_by"),
                    has_any_role(&[
                        Role::Admin,
                        Role::ProjectManager,
                        Role::Engineer,
                        Role::Accountant,
                    ]),
                ]))
                .action("approve", has_permission("projects.cost.approve"))
                .action("comment", delegate("view")),
        )
        .resource(
            ResourceRules::new("payment")
                .view(any_of(vec![is_owner("created_by"), has_any_role(&cost_roles)]))
                .managers(&[Role::Admin, Role::Accountant])
                .create(parent("update"))
                .action("approve", has_permission("projects.cost.approve"))
                .action("release", has_permission("payments.release"))
                .admin_force_delete(),
        )
        .resource(
            ResourceRules::new("invoice")
                .blocked_states(&["paid"])
                .view(any_of(vec![is_owner("created_by"), has_any_role(&cost_roles)]))
                .managers(&[Role::Admin, Role::Accountant])
                .admin_force_delete(),
        )
        .resource(
            ResourceRules::new("budget")
                .view(any_of(vec![is_owner("created_by"), has_any_role(&cost_roles)]))
                .managers(&[Role::Admin, Role::Accountant]),
        )
        .resource(
            ResourceRules::new("budget_line")
                .view(parent("view"))
                .create(parent("update"))
                .update(parent("update"))
                .delete(parent("update"))
                .without(&["restore", "force_delete"]),
        )
        .resource(
            ResourceRules::new("purchase_order")
                .blocked_states(&["approved"])
                .view(any_of(vec![is_owner("created_by"), has_any_role(&cost_roles)]))
                .managers(&[Role::Admin, Role::Accountant])
                .action("approve", has_permission("projects.cost.approve")),
        )
        .resource(
            ResourceRules::new("timesheet")
                .blocked_states(&["approved"])
                .view(any_of(vec![is_owner("created_by"), has_any_role(&cost_roles)]))
                .managers(&[Role::Admin, Role::ProjectManager])
                .action("submit", is_owner("created_by"))
                .action(
                    "approve",
                    has_any_role(&[Role::Admin, Role::ProjectManager]),
                )
                .admin_force_delete(),
        )
}

fn planning_rules(builder: RuleTableBuilder) -> RuleTableBuilder {
    builder
        .resource(
            ResourceRules::new("milestone")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager]),
        )
        .resource(
            ResourceRules::new("schedule")
                .view(always())
                .managers(&[Role::Admin, Role::ProjectManager]),
        )
        .resource(
            ResourceRules::new("equipment")
                .view(always())
                .managers(&[Role::Admin, Role::SiteManager]),
        )
        .resource(
            ResourceRules::new("material")
                .view(always())
                .managers(&[Role::Admin, Role::SiteManager, Role::Foreman]),
        )
        .resource(
            ResourceRules::new("report")
                .view(any_of(vec![
                    public(),
                    is_owner("created_by"),
                    has_any_role(&[Role::Admin, Role::ProjectManager, Role::Accountant]),
                ]))
                .managers(&[Role::Admin, Role::ProjectManager])
                .action("export", has_permission("reports.export")),
        )
}
