//! Fatal errors surfaced by the engine.

use echoself_core::ConfigurationError;
use echoself_storage::StorageError;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EvolutionError>;

/// Errors that abort an engine operation.
///
/// Per-individual evaluation failures and meta-optimizer failures are never
/// surfaced here; they are recovered and reported to the observer.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// Invalid config or uninitialized population
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Checkpoint could not be written, read or decoded
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Failure to save or restore a checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Underlying store failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkpoint could not be serialized
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[source] serde_json::Error),

    /// Bytes are not a well-formed checkpoint
    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),

    /// Bytes are a JSON document from something else
    #[error("not an echoself checkpoint (format: {0:?})")]
    Foreign(String),

    /// Checkpoint written by an incompatible schema version
    #[error("unsupported checkpoint version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the checkpoint
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// Checkpoint decodes but violates an engine invariant
    #[error("inconsistent checkpoint: {0}")]
    Inconsistent(String),
}

impl From<StorageError> for EvolutionError {
    fn from(e: StorageError) -> Self {
        Self::Checkpoint(CheckpointError::Storage(e))
    }
}
