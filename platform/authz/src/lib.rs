//! Tenant-scoped resource authorization for the Sitedesk suite.
//!
//! Answers one question: may this principal perform this action on this
//! resource? Evaluation is synchronous, stateless, and free of I/O; the
//! caller loads the principal and resource snapshots, and the engine
//! resolves capabilities, enforces tenant isolation, and evaluates the
//! registered rule. Refusals are [`Decision`]s with a reason code;
//! [`AuthzError`] is reserved for broken caller contracts and rule-set
//! defects.

mod audit;
mod catalog;
mod decision;
mod error;
mod evaluator;
mod principal;
mod resolver;
mod resource;
pub mod rule;
mod table;
mod tenant;

pub use audit::{AuditSink, DecisionEvent, TracingAuditSink};
pub use catalog::sitedesk_rules;
pub use decision::{Decision, Reason};
pub use error::AuthzError;
pub use evaluator::{Engine, MAX_DELEGATION_DEPTH};
pub use principal::{Principal, Role, TenantId};
pub use resolver::{Capabilities, WILDCARD_PERMISSION, resolve};
pub use resource::{ResourceRecord, ResourceRef, ResourceView};
pub use rule::{Predicate, Rule};
pub use table::{ResourceRules, RuleTable, RuleTableBuilder};
pub use tenant::same_tenant;
