use thiserror::Error;

/// Contract violations and registration defects. Ordinary denials are
/// [`Decision`](crate::Decision)s, never errors; anything here means the
/// caller or the rule set is broken and should surface as a 500, not a 403.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The supplied resource does not carry the kind the caller asked
    /// about (or the kind tag is empty). The caller loaded one thing and
    /// is authorizing another.
    #[error("unknown resource type: asked for {requested:?}, resource is {loaded:?}")]
    UnknownResourceType { requested: String, loaded: String },

    #[error("rule delegation for {kind}.{action} exceeded depth {max}")]
    DelegationDepth {
        kind: String,
        action: String,
        max: usize,
    },

    #[error("duplicate rule registered for {kind}.{action}")]
    DuplicateRule { kind: String, action: String },
}
