use std::any::Any;
use std::sync::Arc;

/// Value stored in a scope's attribute bag. Hosts keep heterogeneous state in
/// these bags, so the value type is open; the registry downcasts internally.
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// Host-supplied key/value association for one scope instance.
///
/// One store exists per application instance, per request instance, and per
/// session instance. Semantics are "last value wins" with no ordering
/// guarantees; the host hands the store to lifecycle callbacks and to code
/// running inside the scope, never to arbitrary outside code.
pub trait ScopeStore: Send + Sync {
    /// Returns the value bound under `key`, if any.
    fn get(&self, key: &str) -> Option<Attribute>;

    /// Binds `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Attribute);

    /// Removes and returns the value bound under `key`.
    fn remove(&self, key: &str) -> Option<Attribute>;
}

impl<S: ScopeStore + ?Sized> ScopeStore for Arc<S> {
    fn get(&self, key: &str) -> Option<Attribute> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Attribute) {
        (**self).set(key, value);
    }

    fn remove(&self, key: &str) -> Option<Attribute> {
        (**self).remove(key)
    }
}
