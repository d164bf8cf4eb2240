use scoped_tempfiles::{
    application_pool, request_pool, session_pool, InMemoryScopeStore, ScopeResult,
    TempFileLifecycle,
};

fn main() -> ScopeResult<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let temp_dir = std::env::temp_dir().join("scoped-tempfiles-quickstart");
    let lifecycle = TempFileLifecycle::new();

    // The host would own these stores; here one per scope instance. The
    // application store is shared process-wide, so it lives in an Arc.
    let app_store = std::sync::Arc::new(InMemoryScopeStore::new());
    lifecycle.application_started(&app_store, &temp_dir)?;
    let app_pool = application_pool(&app_store)?;
    println!("application pool rooted at {}", app_pool.base_dir().display());

    println!("== request scope ==");
    let request_store = InMemoryScopeStore::new();
    lifecycle.request_started(&request_store, &temp_dir)?;
    let pool = request_pool(&request_store)?;
    let scratch = pool.create().map_err(|err| {
        scoped_tempfiles::ScopeError::PoolCreate {
            scope: scoped_tempfiles::ScopeKind::Request,
            source: err,
        }
    })?;
    println!("scratch file: {}", scratch.path().display());
    lifecycle.request_finished(&request_store);
    println!("request finished, scratch deleted: {}", !scratch.path().exists());

    println!("== session scope ==");
    let session_store = InMemoryScopeStore::new();
    lifecycle.session_created(&session_store, &temp_dir)?;
    println!("session pool bound: {}", session_pool(&session_store).is_ok());

    lifecycle.session_will_passivate(&session_store);
    match session_pool(&session_store) {
        Err(err) => println!("during passivation: {err}"),
        Ok(_) => println!("during passivation: pool unexpectedly present"),
    }

    lifecycle.session_did_activate(&session_store, &temp_dir)?;
    println!("after activation: {}", session_pool(&session_store).is_ok());
    lifecycle.session_destroyed(&session_store);

    lifecycle.application_stopped(&app_store);
    Ok(())
}
