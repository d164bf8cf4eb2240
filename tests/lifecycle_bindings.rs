use scoped_tempfiles::{
    application_pool, request_pool, session_pool, InMemoryScopeStore, ScopeError,
    TempFileLifecycle, TempFilePool,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_factory(closes: Arc<AtomicUsize>) -> Arc<dyn scoped_tempfiles::PoolFactory> {
    Arc::new(scoped_tempfiles::factory_fn(
        move |base: &Path| -> io::Result<Arc<dyn TempFilePool>> {
            Ok(Arc::new(CountingPool {
                base: base.to_path_buf(),
                closes: closes.clone(),
            }))
        },
    ))
}

struct CountingPool {
    base: PathBuf,
    closes: Arc<AtomicUsize>,
}

impl TempFilePool for CountingPool {
    fn base_dir(&self) -> &Path {
        &self.base
    }

    fn create(&self) -> io::Result<scoped_tempfiles::TempFileHandle> {
        Err(io::Error::other("counting pool does not create files"))
    }

    fn release(&self, _handle: &scoped_tempfiles::TempFileHandle) -> io::Result<()> {
        Ok(())
    }

    fn close_all(&self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn fetch_before_start_fails_not_bound() {
    let store = InMemoryScopeStore::new();

    for (result, expected) in [
        (application_pool(&store).map(|_| ()), "application"),
        (request_pool(&store).map(|_| ()), "request"),
        (session_pool(&store).map(|_| ()), "session"),
    ] {
        let err = result.expect_err("fetch before start should fail");
        match err {
            ScopeError::NotBound { scope } => assert_eq!(scope.as_str(), expected),
            other => panic!("expected NotBound, got {other:?}"),
        }
    }
}

#[test]
fn not_bound_message_names_scope_and_remediation() {
    let store = InMemoryScopeStore::new();
    let err = request_pool(&store).map(|_| ()).expect_err("nothing bound");
    let message = err.to_string();
    assert!(message.contains("request"), "scope missing: {message}");
    assert!(
        message.contains("lifecycle listener"),
        "remediation hint missing: {message}"
    );
    assert!(!err.is_transient());
}

#[test]
fn application_scope_binds_and_tears_down() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lifecycle = TempFileLifecycle::new();
    let store = InMemoryScopeStore::new();

    lifecycle
        .application_started(&store, dir.path())
        .expect("application start");
    let pool = application_pool(&store).expect("pool bound");
    let handle = pool.create().expect("create scratch file");
    assert!(handle.path().starts_with(dir.path()));

    lifecycle.application_stopped(&store);
    assert!(!handle.path().exists(), "scratch file should be deleted");
    assert!(matches!(
        application_pool(&store),
        Err(ScopeError::NotBound { .. })
    ));
}

#[test]
fn request_cycles_are_independent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lifecycle = TempFileLifecycle::new();

    // First request: files live under the supplied base dir, deleted on end.
    let first = InMemoryScopeStore::new();
    lifecycle
        .request_started(&first, dir.path())
        .expect("first request start");
    let pool = request_pool(&first).expect("first pool");
    let handle = pool.create().expect("create");
    assert!(handle.path().starts_with(dir.path()));
    lifecycle.request_finished(&first);
    assert!(!handle.path().exists());

    // Second request cycle succeeds independently; no leakage of the old
    // binding or its pool.
    let second = InMemoryScopeStore::new();
    lifecycle
        .request_started(&second, dir.path())
        .expect("second request start");
    let next = request_pool(&second).expect("second pool");
    assert!(!Arc::ptr_eq(&pool, &next));
    let handle = next.create().expect("create on fresh pool");
    assert!(handle.path().exists());
    lifecycle.request_finished(&second);

    assert!(matches!(
        request_pool(&first),
        Err(ScopeError::NotBound { .. })
    ));
}

#[test]
fn request_finished_twice_tears_down_once() {
    let closes = Arc::new(AtomicUsize::new(0));
    let lifecycle = TempFileLifecycle::new().with_factory(counting_factory(closes.clone()));
    let store = InMemoryScopeStore::new();

    lifecycle
        .request_started(&store, Path::new("/tmp/app"))
        .expect("request start");
    lifecycle.request_finished(&store);
    lifecycle.request_finished(&store);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn application_stopped_without_start_is_a_noop() {
    let lifecycle = TempFileLifecycle::new();
    let store = InMemoryScopeStore::new();
    lifecycle.application_stopped(&store);
    lifecycle.application_stopped(&store);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "already bound")]
fn double_fired_start_event_trips_the_assertion() {
    let closes = Arc::new(AtomicUsize::new(0));
    let lifecycle = TempFileLifecycle::new().with_factory(counting_factory(closes));
    let store = InMemoryScopeStore::new();

    lifecycle
        .request_started(&store, Path::new("/tmp/app"))
        .expect("first start");
    // A second start for the same live scope is a host-lifecycle bug.
    let _ = lifecycle.request_started(&store, Path::new("/tmp/app"));
}

#[test]
fn factory_failure_surfaces_as_pool_create() {
    let factory: Arc<dyn scoped_tempfiles::PoolFactory> = Arc::new(scoped_tempfiles::factory_fn(
        |_base: &Path| -> io::Result<Arc<dyn TempFilePool>> {
            Err(io::Error::other("disk full"))
        },
    ));
    let lifecycle = TempFileLifecycle::new().with_factory(factory);
    let store = InMemoryScopeStore::new();

    let err = lifecycle
        .request_started(&store, Path::new("/tmp/app"))
        .expect_err("factory failure should propagate");
    assert!(matches!(err, ScopeError::PoolCreate { .. }));
    // A failed bind leaves nothing in the store.
    assert!(matches!(
        request_pool(&store),
        Err(ScopeError::NotBound { .. })
    ));
}
