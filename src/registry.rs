use crate::diagnostics::{close_reported, DiagnosticSink};
use crate::error::{ScopeError, ScopeResult};
use crate::pool::{PoolFactory, TempFilePool};
use crate::store::ScopeStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The three container-managed scope kinds a pool can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Application,
    Request,
    Session,
}

impl ScopeKind {
    /// Fixed attribute key this scope kind's binding lives under. A fixed key
    /// means at most one binding per scope instance.
    pub const fn binding_key(self) -> &'static str {
        match self {
            ScopeKind::Application => "scoped_tempfiles.pool.application",
            ScopeKind::Request => "scoped_tempfiles.pool.request",
            ScopeKind::Session => "scoped_tempfiles.session",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Application => "application",
            ScopeKind::Request => "request",
            ScopeKind::Session => "session",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Newtype the pool is stored under, so fetches downcast against a type this
/// crate controls rather than against whatever else the host keeps in the bag.
struct BoundPool(Arc<dyn TempFilePool>);

/// Opens a pool rooted at `base_dir` and stores it under the scope's fixed
/// key. Double-binding indicates a host-lifecycle bug, so it is flagged by a
/// debug assertion rather than a runtime error path.
pub fn bind(
    store: &dyn ScopeStore,
    kind: ScopeKind,
    factory: &dyn PoolFactory,
    base_dir: &Path,
) -> ScopeResult<Arc<dyn TempFilePool>> {
    let key = kind.binding_key();
    debug_assert!(
        store.get(key).is_none(),
        "a temp-file pool is already bound to the {kind} scope"
    );
    let pool = factory
        .open(base_dir)
        .map_err(|source| ScopeError::PoolCreate {
            scope: kind,
            source,
        })?;
    store.set(key, Arc::new(BoundPool(pool.clone())));
    tracing::debug!(scope = %kind, base_dir = %base_dir.display(), "temp-file pool bound");
    Ok(pool)
}

/// Looks up the pool bound to the scope, failing with [`ScopeError::NotBound`]
/// when the lifecycle listener never ran for this scope instance.
pub fn fetch(store: &dyn ScopeStore, kind: ScopeKind) -> ScopeResult<Arc<dyn TempFilePool>> {
    store
        .get(kind.binding_key())
        .and_then(|attr| attr.downcast::<BoundPool>().ok())
        .map(|bound| bound.0.clone())
        .ok_or(ScopeError::NotBound { scope: kind })
}

/// Removes the scope's binding and tears its pool down. Teardown failures go
/// to the sink, never to the caller. Idempotent: unbinding an empty scope is
/// a no-op.
pub fn unbind(store: &dyn ScopeStore, kind: ScopeKind, sink: &dyn DiagnosticSink) {
    let Some(attr) = store.remove(kind.binding_key()) else {
        return;
    };
    if let Ok(bound) = attr.downcast::<BoundPool>() {
        close_reported(bound.0.as_ref(), kind, kind.binding_key(), sink);
        tracing::debug!(scope = %kind, "temp-file pool unbound");
    }
}
