//! In-process store, for tests and throwaway worlds.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::Result;

/// A [`KeyValueStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, i32>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<i32>> {
        Ok(self.values.lock().get(key).copied())
    }

    fn save(&self, key: &str, value: i32) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .values
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn add(&self, key: &str, amount: i32) -> Result<i32> {
        let mut values = self.values.lock();
        let entry = values.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
        Ok(*entry)
    }
}
