//! In-process session store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use fitgate_core::error::{FitgateError, Result};
use fitgate_core::session::{SessionStorage, StorageOp};

/// Volatile store for tests and for hosts without a writable disk.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store, e.g. to simulate data left by a previous run.
    pub fn with_items<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = items
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            items: Mutex::new(map),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|e| FitgateError::internal(format!("Failed to lock session items: {}", e)))
    }

    /// Number of stored keys. A poisoned lock still reports its contents.
    pub fn len(&self) -> usize {
        match self.items.lock() {
            Ok(items) => items.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn write_batch(&self, ops: &[StorageOp]) -> Result<()> {
        let mut items = self.lock()?;
        for op in ops {
            match op {
                StorageOp::Set { key, value } => {
                    items.insert(key.clone(), value.clone());
                }
                StorageOp::Remove { key } => {
                    items.remove(key);
                }
            }
        }
        Ok(())
    }
}
