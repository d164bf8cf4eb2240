use crate::store::{Attribute, ScopeStore};
use dashmap::DashMap;

/// In-memory scope store backed by a concurrent hash map.
///
/// Hosts without their own attribute bag allocate one of these per scope
/// instance; tests use it as the reference store.
#[derive(Default)]
pub struct InMemoryScopeStore {
    attributes: DashMap<String, Attribute>,
}

impl InMemoryScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound attributes, across all keys.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl ScopeStore for InMemoryScopeStore {
    fn get(&self, key: &str) -> Option<Attribute> {
        self.attributes.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: Attribute) {
        self.attributes.insert(key.to_owned(), value);
    }

    fn remove(&self, key: &str) -> Option<Attribute> {
        self.attributes.remove(key).map(|(_, value)| value)
    }
}
