#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod error;
pub mod inmemory;
pub mod lifecycle;
pub mod pool;
pub mod registry;
pub mod session;
pub mod store;

pub use diagnostics::{DiagnosticSink, TeardownFailure, TracingSink};
pub use error::{ScopeError, ScopeResult};
pub use inmemory::InMemoryScopeStore;
pub use lifecycle::{application_pool, request_pool, session_pool, TempFileLifecycle};
pub use pool::{factory_fn, DirPool, DirPoolFactory, FactoryFn, PoolFactory, TempFileHandle, TempFilePool};
pub use registry::ScopeKind;
pub use session::SessionTempFiles;
pub use store::{Attribute, ScopeStore};
