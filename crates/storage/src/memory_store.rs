//! In-memory checkpoint store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::trait_::validate_location;
use super::{CheckpointStore, Result, StorageError};

/// Volatile store backed by a map. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CheckpointStore for MemoryStore {
    async fn write(&self, location: &str, blob: &[u8]) -> Result<()> {
        validate_location(location)?;
        self.blobs.lock().await.insert(location.to_string(), blob.to_vec());
        Ok(())
    }

    async fn read(&self, location: &str) -> Result<Vec<u8>> {
        validate_location(location)?;
        self.blobs
            .lock()
            .await
            .get(location)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }
}
