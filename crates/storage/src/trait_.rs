//! Storage trait abstraction.

use async_trait::async_trait;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing stored at the location
    #[error("Not found: {0}")]
    NotFound(String),

    /// Location is empty or escapes the store root
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// Blob store for engine checkpoints.
///
/// Locations are caller-chosen relative names. A write either fully
/// replaces the blob at a location or leaves the previous one in place.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Write a blob, replacing any previous one at `location`.
    async fn write(&self, location: &str, blob: &[u8]) -> Result<()>;

    /// Read the blob at `location`. Missing blobs are `StorageError::NotFound`.
    async fn read(&self, location: &str) -> Result<Vec<u8>>;
}

/// Reject empty, absolute and parent-escaping locations.
pub(crate) fn validate_location(location: &str) -> Result<()> {
    let path = std::path::Path::new(location);
    let escapes = path.components().any(|c| {
        !matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir)
    });
    if location.trim().is_empty() || escapes {
        return Err(StorageError::InvalidLocation(location.to_string()));
    }
    Ok(())
}
