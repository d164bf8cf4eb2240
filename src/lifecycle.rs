use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{ScopeError, ScopeResult};
use crate::pool::{DirPoolFactory, PoolFactory, TempFilePool};
use crate::registry::{self, ScopeKind};
use crate::session::SessionTempFiles;
use crate::store::ScopeStore;
use std::path::Path;
use std::sync::Arc;

/// Entry points the host's lifecycle callbacks delegate to.
///
/// One instance is registered per host. Every method may be called from
/// whatever worker thread the host dispatches the event on; the host
/// guarantees per-scope-instance ordering (start happens-before use
/// happens-before end), and this type adds no synchronization of its own
/// across those events.
pub struct TempFileLifecycle {
    factory: Arc<dyn PoolFactory>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for TempFileLifecycle {
    fn default() -> Self {
        Self {
            factory: Arc::new(DirPoolFactory),
            sink: Arc::new(TracingSink),
        }
    }
}

impl TempFileLifecycle {
    /// Lifecycle with the default directory-backed pool factory and the
    /// tracing diagnostic sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pool factory. Hosts and tests inject their own pool
    /// implementation here.
    pub fn with_factory(mut self, factory: Arc<dyn PoolFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replaces the teardown-failure sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Application scope-start: bind a pool for the whole process lifetime.
    pub fn application_started(
        &self,
        store: &dyn ScopeStore,
        temp_dir: &Path,
    ) -> ScopeResult<()> {
        registry::bind(store, ScopeKind::Application, self.factory.as_ref(), temp_dir)?;
        Ok(())
    }

    /// Application scope-end: tear the pool down exactly once. Idempotent.
    pub fn application_stopped(&self, store: &dyn ScopeStore) {
        registry::unbind(store, ScopeKind::Application, self.sink.as_ref());
    }

    /// Request-start: bind a pool to this request's store. Concurrent
    /// requests get independent stores, so the request itself is the
    /// concurrency unit and no locking happens here.
    pub fn request_started(&self, store: &dyn ScopeStore, temp_dir: &Path) -> ScopeResult<()> {
        registry::bind(store, ScopeKind::Request, self.factory.as_ref(), temp_dir)?;
        Ok(())
    }

    /// Request-end counterpart of [`Self::request_started`]. Idempotent.
    pub fn request_finished(&self, store: &dyn ScopeStore) {
        registry::unbind(store, ScopeKind::Request, self.sink.as_ref());
    }

    /// Session created: allocate the wrapper and its first pool.
    pub fn session_created(&self, store: &dyn ScopeStore, temp_dir: &Path) -> ScopeResult<()> {
        let key = ScopeKind::Session.binding_key();
        debug_assert!(
            store.get(key).is_none(),
            "a session temp-file wrapper is already bound"
        );
        let pool = self
            .factory
            .open(temp_dir)
            .map_err(|source| ScopeError::PoolCreate {
                scope: ScopeKind::Session,
                source,
            })?;
        store.set(key, Arc::new(SessionTempFiles::with_pool(pool)));
        tracing::debug!(temp_dir = %temp_dir.display(), "session temp-file wrapper bound");
        Ok(())
    }

    /// Session about to be passivated: tear the pool down before the host
    /// serializes or relocates the session. The wrapper stays bound. No-op
    /// when the pool is already gone or the wrapper was never bound.
    pub fn session_will_passivate(&self, store: &dyn ScopeStore) {
        if let Ok(wrapper) = session_wrapper(store) {
            wrapper.drop_pool(self.sink.as_ref());
        }
    }

    /// Session resumed: recreate the pool against `temp_dir` as resolved by
    /// the (possibly different) host instance handling the activation. No-op
    /// when the wrapper already holds a pool or was never bound.
    pub fn session_did_activate(
        &self,
        store: &dyn ScopeStore,
        temp_dir: &Path,
    ) -> ScopeResult<()> {
        match session_wrapper(store) {
            Ok(wrapper) => wrapper.recreate_pool(self.factory.as_ref(), temp_dir),
            Err(_) => Ok(()),
        }
    }

    /// Session destroyed: discard the wrapper and tear down its pool if one
    /// is present. Idempotent.
    pub fn session_destroyed(&self, store: &dyn ScopeStore) {
        let Some(attr) = store.remove(ScopeKind::Session.binding_key()) else {
            return;
        };
        if let Ok(wrapper) = attr.downcast::<SessionTempFiles>() {
            wrapper.drop_pool(self.sink.as_ref());
            tracing::debug!("session temp-file wrapper unbound");
        }
    }
}

fn session_wrapper(store: &dyn ScopeStore) -> ScopeResult<Arc<SessionTempFiles>> {
    store
        .get(ScopeKind::Session.binding_key())
        .and_then(|attr| attr.downcast::<SessionTempFiles>().ok())
        .ok_or(ScopeError::NotBound {
            scope: ScopeKind::Session,
        })
}

/// Pool bound to the application-wide store. Safe to call from any thread
/// for the whole process lifetime; concurrent use of the pool itself is the
/// pool implementation's contract.
pub fn application_pool(store: &dyn ScopeStore) -> ScopeResult<Arc<dyn TempFilePool>> {
    registry::fetch(store, ScopeKind::Application)
}

/// Pool bound to a request's store.
pub fn request_pool(store: &dyn ScopeStore) -> ScopeResult<Arc<dyn TempFilePool>> {
    registry::fetch(store, ScopeKind::Request)
}

/// Pool bound to a session's store.
///
/// Fails with [`ScopeError::NotBound`] when the session listener never ran,
/// and with [`ScopeError::ResourceUnavailable`] when the wrapper exists but
/// the session is currently passivated, a sharper signal than not-found,
/// since the binding metadata exists and the pool is only transiently gone.
pub fn session_pool(store: &dyn ScopeStore) -> ScopeResult<Arc<dyn TempFilePool>> {
    let wrapper = session_wrapper(store)?;
    wrapper.pool().ok_or(ScopeError::ResourceUnavailable)
}

/// Session wrapper itself, for hosts that need passivation-state metadata.
pub fn session_temp_files(store: &dyn ScopeStore) -> ScopeResult<Arc<SessionTempFiles>> {
    session_wrapper(store)
}
