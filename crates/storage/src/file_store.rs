//! File-system checkpoint store.
//!
//! Stores each checkpoint as a file under a root directory. Writes go to a
//! temporary sibling file first and are moved into place with a rename, so
//! readers never observe a half-written checkpoint.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::trait_::validate_location;
use super::{CheckpointStore, Result, StorageError};

const TMP_SUFFIX: &str = ".tmp";

/// File-based checkpoint store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }
}

#[async_trait::async_trait]
impl CheckpointStore for FileStore {
    async fn write(&self, location: &str, blob: &[u8]) -> Result<()> {
        validate_location(location)?;
        let path = self.blob_path(location);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = PathBuf::from(format!("{}.{}{}", path.display(), ulid::Ulid::new(), TMP_SUFFIX));
        if let Err(e) = fs::write(&tmp, blob).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("Wrote {} ({} bytes)", location, blob.len());
        Ok(())
    }

    async fn read(&self, location: &str) -> Result<Vec<u8>> {
        validate_location(location)?;
        match fs::read(self.blob_path(location)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
