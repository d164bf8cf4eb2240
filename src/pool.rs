use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Handle to a single scratch file tracked by a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TempFileHandle {
    id: Uuid,
    path: PathBuf,
}

impl TempFileHandle {
    /// Mints a handle; pool implementations outside this crate use this to
    /// return their own tracked files.
    pub fn new(id: Uuid, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Identifier the pool tracks this file under.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Location of the scratch file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A disposable pool of scratch files rooted at a base directory.
///
/// Implementations must make `close_all` idempotent and callable from any
/// thread; lifecycle events for different scope instances may fire on
/// arbitrary host worker threads.
pub trait TempFilePool: Send + Sync + 'static {
    /// Directory the pool creates its files under.
    fn base_dir(&self) -> &Path;

    /// Creates and tracks a fresh scratch file.
    fn create(&self) -> io::Result<TempFileHandle>;

    /// Deletes a single tracked file and stops tracking it.
    fn release(&self, handle: &TempFileHandle) -> io::Result<()>;

    /// Deletes every file the pool still tracks. Idempotent.
    fn close_all(&self) -> io::Result<()>;
}

/// Opens a pool against a host-resolved base directory.
///
/// The base directory is passed at every open because session reactivation
/// may happen on a different host instance with a different temp dir.
pub trait PoolFactory: Send + Sync + 'static {
    fn open(&self, base_dir: &Path) -> io::Result<Arc<dyn TempFilePool>>;
}

/// Adapts a closure into a [`PoolFactory`]; test harnesses use this to
/// inject fake pools.
pub fn factory_fn<F>(f: F) -> FactoryFn<F>
where
    F: Fn(&Path) -> io::Result<Arc<dyn TempFilePool>> + Send + Sync + 'static,
{
    FactoryFn(f)
}

/// A [`PoolFactory`] backed by a closure. See [`factory_fn`].
pub struct FactoryFn<F>(F);

impl<F> PoolFactory for FactoryFn<F>
where
    F: Fn(&Path) -> io::Result<Arc<dyn TempFilePool>> + Send + Sync + 'static,
{
    fn open(&self, base_dir: &Path) -> io::Result<Arc<dyn TempFilePool>> {
        (self.0)(base_dir)
    }
}

enum Tracked {
    Open(HashMap<Uuid, PathBuf>),
    Closed,
}

/// Default pool: uuid-named files under the base directory, tracked until
/// released or the pool is closed.
pub struct DirPool {
    base_dir: PathBuf,
    tracked: Mutex<Tracked>,
}

impl DirPool {
    /// Creates a pool rooted at `base_dir`. The directory must already exist;
    /// [`DirPoolFactory`] creates it on open.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            tracked: Mutex::new(Tracked::Open(HashMap::new())),
        }
    }

    /// Number of files currently tracked.
    pub fn tracked_len(&self) -> usize {
        match &*self.tracked.lock() {
            Tracked::Open(files) => files.len(),
            Tracked::Closed => 0,
        }
    }

    fn closed_error() -> io::Error {
        io::Error::other("temp-file pool is closed")
    }
}

impl TempFilePool for DirPool {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn create(&self) -> io::Result<TempFileHandle> {
        let id = Uuid::new_v4();
        let path = self.base_dir.join(format!("scratch-{id}.tmp"));
        let mut guard = self.tracked.lock();
        let files = match &mut *guard {
            Tracked::Open(files) => files,
            Tracked::Closed => return Err(Self::closed_error()),
        };
        fs::File::create(&path)?;
        files.insert(id, path.clone());
        Ok(TempFileHandle { id, path })
    }

    fn release(&self, handle: &TempFileHandle) -> io::Result<()> {
        let removed = match &mut *self.tracked.lock() {
            Tracked::Open(files) => files.remove(&handle.id),
            Tracked::Closed => None,
        };
        match removed {
            Some(path) => remove_if_present(&path),
            None => Ok(()),
        }
    }

    fn close_all(&self) -> io::Result<()> {
        let files = match std::mem::replace(&mut *self.tracked.lock(), Tracked::Closed) {
            Tracked::Open(files) => files,
            Tracked::Closed => return Ok(()),
        };
        let mut first_error = None;
        for path in files.values() {
            if let Err(err) = remove_if_present(path) {
                tracing::debug!(path = %path.display(), error = %err, "scratch file not deleted");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Factory for [`DirPool`], creating the base directory if missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirPoolFactory;

impl PoolFactory for DirPoolFactory {
    fn open(&self, base_dir: &Path) -> io::Result<Arc<dyn TempFilePool>> {
        fs::create_dir_all(base_dir)?;
        Ok(Arc::new(DirPool::new(base_dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_tracks_and_release_deletes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = DirPool::new(dir.path());

        let handle = pool.create().expect("create");
        assert!(handle.path().exists());
        assert!(handle.path().starts_with(dir.path()));
        assert_eq!(pool.tracked_len(), 1);

        pool.release(&handle).expect("release");
        assert!(!handle.path().exists());
        assert_eq!(pool.tracked_len(), 0);

        // Releasing an already-released handle is a no-op.
        pool.release(&handle).expect("second release");
    }

    #[test]
    fn close_all_deletes_everything_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = DirPool::new(dir.path());
        let handles: Vec<_> = (0..3).map(|_| pool.create().expect("create")).collect();

        pool.close_all().expect("close");
        for handle in &handles {
            assert!(!handle.path().exists(), "{:?} should be deleted", handle.path());
        }

        pool.close_all().expect("second close is a no-op");
    }

    #[test]
    fn create_after_close_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = DirPool::new(dir.path());
        pool.close_all().expect("close");
        assert!(pool.create().is_err());
    }

    #[test]
    fn factory_creates_missing_base_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a/b");
        let pool = DirPoolFactory.open(&nested).expect("open");
        assert_eq!(pool.base_dir(), nested.as_path());
        let handle = pool.create().expect("create");
        assert!(handle.path().exists());
    }
}
