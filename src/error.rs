use crate::registry::ScopeKind;
use std::io;
use thiserror::Error;

pub type ScopeResult<T> = Result<T, ScopeError>;

/// Failures surfaced to callers of the binding and fetch operations.
///
/// Teardown failures are not represented here: they are reported through
/// [`crate::diagnostics::DiagnosticSink`] and never propagate, so a failed
/// cleanup cannot abort the host's own scope-teardown sequence.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The lifecycle listener for this scope never ran. Host misconfiguration;
    /// never recovered locally.
    #[error(
        "no temp-file pool is bound to the {scope} scope; \
         ensure the {scope} lifecycle listener is registered with the host"
    )]
    NotBound { scope: ScopeKind },

    /// Session-only: the wrapper exists but its pool is torn down
    /// (mid-passivation window). Transient; a pool is recreated on activation.
    #[error(
        "the session temp-file pool is unavailable while the session is \
         passivated; it is recreated when the session activates"
    )]
    ResourceUnavailable,

    /// The pool factory failed while binding a scope.
    #[error("failed to open a temp-file pool for the {scope} scope")]
    PoolCreate {
        scope: ScopeKind,
        #[source]
        source: io::Error,
    },
}

impl ScopeError {
    /// Whether retrying after the host completes its current transition can
    /// succeed. Only the passivation window qualifies.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScopeError::ResourceUnavailable)
    }
}
