use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::decision::{Decision, Reason};
use crate::principal::TenantId;

/// Snapshot of one evaluated decision, handed to the audit collaborator.
#[derive(Clone, Debug, Serialize)]
pub struct DecisionEvent {
    pub occurred_at: DateTime<Utc>,
    pub principal_id: Uuid,
    pub principal_tenant: Option<TenantId>,
    pub action: String,
    pub resource_kind: String,
    pub resource_id: Option<Uuid>,
    pub resource_tenant: Option<TenantId>,
    pub allowed: bool,
    pub reason: Reason,
}

impl DecisionEvent {
    pub fn decision(&self) -> Decision {
        if self.allowed {
            Decision::allow()
        } else {
            Decision::deny(self.reason)
        }
    }
}

/// Fire-and-forget receiver for decision events. Implementations must not
/// block and must not fail; the decision is already made when they run.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &DecisionEvent);
}

/// Default sink: structured tracing events on the `authz.audit` target.
/// Allows log at debug, denials at info so operators can trail refusals
/// without drowning in routine grants.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &DecisionEvent) {
        let resource_id = event.resource_id.map(|id| id.to_string());
        if event.allowed {
            tracing::debug!(
                target: "authz.audit",
                principal = %event.principal_id,
                action = %event.action,
                kind = %event.resource_kind,
                resource = resource_id.as_deref(),
                "authorized"
            );
        } else {
            tracing::info!(
                target: "authz.audit",
                principal = %event.principal_id,
                action = %event.action,
                kind = %event.resource_kind,
                resource = resource_id.as_deref(),
                reason = %event.reason,
                "denied"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_reconstructs_its_decision() {
        let event = DecisionEvent {
            occurred_at: Utc::now(),
            principal_id: Uuid::new_v4(),
            principal_tenant: Some(TenantId::new("acme")),
            action: "update".to_string(),
            resource_kind: "task".to_string(),
            resource_id: Some(Uuid::new_v4()),
            resource_tenant: Some(TenantId::new("acme")),
            allowed: false,
            reason: Reason::NotOwner,
        };
        assert_eq!(event.decision(), Decision::deny(Reason::NotOwner));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reason"], "NOT_OWNER");
    }
}
