use crate::pool::TempFilePool;
use crate::registry::ScopeKind;
use std::io;
use thiserror::Error;

/// A teardown failure, reported as a value instead of propagated as an error.
#[derive(Debug, Error)]
#[error("error deleting temporary files for the {scope} scope (key {key}): {error}")]
pub struct TeardownFailure {
    /// Scope whose pool failed to tear down.
    pub scope: ScopeKind,
    /// Binding key the pool was stored under.
    pub key: &'static str,
    /// Underlying filesystem error.
    pub error: io::Error,
}

/// Receives teardown failures suppressed at the unbind boundary.
///
/// Cleanup failures must never break the host's scope-teardown sequence, so
/// they are handed to this sink and otherwise swallowed. Hosts route them to
/// their diagnostic channel; test harnesses collect them.
pub trait DiagnosticSink: Send + Sync + 'static {
    fn teardown_failed(&self, failure: TeardownFailure);
}

/// Default sink: a warn-level tracing event with the scope and key.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn teardown_failed(&self, failure: TeardownFailure) {
        tracing::warn!(
            scope = %failure.scope,
            key = failure.key,
            error = %failure.error,
            "error deleting temporary files",
        );
    }
}

/// Closes a pool, routing any failure to the sink.
pub(crate) fn close_reported(
    pool: &dyn TempFilePool,
    scope: ScopeKind,
    key: &'static str,
    sink: &dyn DiagnosticSink,
) {
    if let Err(error) = pool.close_all() {
        sink.teardown_failed(TeardownFailure { scope, key, error });
    }
}
