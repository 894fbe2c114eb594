//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::collection::CanvasCollection;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, CanvasCollection>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, state: &CanvasCollection) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let state = state.clone();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            entries.insert(key, state);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<CanvasCollection>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            entries.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            entries.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries.keys().cloned().collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries.contains_key(&key))
        })
    }
}
