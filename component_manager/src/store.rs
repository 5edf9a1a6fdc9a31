//! Per-manager value store
//!
//! Named values of any type, scoped to one manager and dropped when it
//! shuts down. Components on the same manager use it to share state without
//! global variables.

use std::any::Any;
use std::collections::HashMap;

/// Heterogeneous key/value store
#[derive(Default)]
pub struct ValueStore {
    values: HashMap<String, Box<dyn Any>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning true if it replaced a value
    pub fn store<T: Any>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.values.insert(key.into(), Box::new(value)).is_some()
    }

    /// Loads the value under `key` if it exists and has type `T`
    pub fn load<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn load_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
