use crate::diagnostics::{close_reported, DiagnosticSink};
use crate::error::{ScopeError, ScopeResult};
use crate::pool::{PoolFactory, TempFilePool};
use crate::registry::ScopeKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;

/// Session-scope indirection that keeps the pool out of the session's
/// serialized form.
///
/// The wrapper is created once per session and lives until the session is
/// destroyed; the pool inside it is torn down on passivation and recreated on
/// activation, possibly many times. The pool field is skipped by serde, so a
/// persisted or migrated session never carries the pool; deserializing
/// yields a wrapper in the passivated state, ready for reactivation.
#[derive(Serialize, Deserialize)]
pub struct SessionTempFiles {
    #[serde(skip)]
    pool: Mutex<Option<Arc<dyn TempFilePool>>>,
    created_at: OffsetDateTime,
}

impl SessionTempFiles {
    pub(crate) fn with_pool(pool: Arc<dyn TempFilePool>) -> Self {
        Self {
            pool: Mutex::new(Some(pool)),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// When the wrapper was first created. Survives passivation cycles.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// The currently held pool, if the session is active.
    pub fn pool(&self) -> Option<Arc<dyn TempFilePool>> {
        self.pool.lock().clone()
    }

    /// True between passivation and the next activation, and after a
    /// serde round-trip.
    pub fn is_passivated(&self) -> bool {
        self.pool.lock().is_none()
    }

    /// Takes the pool out and tears it down; no-op when already gone.
    /// `close_all` runs outside the lock so a slow filesystem delete cannot
    /// block concurrent accessor calls.
    pub(crate) fn drop_pool(&self, sink: &dyn DiagnosticSink) {
        let taken = self.pool.lock().take();
        if let Some(pool) = taken {
            close_reported(
                pool.as_ref(),
                ScopeKind::Session,
                ScopeKind::Session.binding_key(),
                sink,
            );
        }
    }

    /// Recreates the pool against the directory resolved at activation time.
    /// Activation may happen on a different host instance, so the base
    /// directory is never cached from creation time. No-op when a pool is
    /// already present.
    pub(crate) fn recreate_pool(
        &self,
        factory: &dyn PoolFactory,
        base_dir: &Path,
    ) -> ScopeResult<()> {
        let mut guard = self.pool.lock();
        if guard.is_none() {
            let pool = factory
                .open(base_dir)
                .map_err(|source| ScopeError::PoolCreate {
                    scope: ScopeKind::Session,
                    source,
                })?;
            *guard = Some(pool);
        }
        Ok(())
    }
}

impl fmt::Debug for SessionTempFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTempFiles")
            .field("passivated", &self.is_passivated())
            .field("created_at", &self.created_at)
            .finish()
    }
}
