//! Versioned checkpoint schema.

use echoself_core::{EvolutionConfig, GenerationStats, Individual, Time};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;

/// Value of the `format` header field.
pub const CHECKPOINT_FORMAT: &str = "echoself-checkpoint";

/// Schema version written and accepted by this build.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Full engine state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<G> {
    /// Always [`CHECKPOINT_FORMAT`]
    pub format: String,
    /// Schema version
    pub version: u32,
    /// When the snapshot was taken
    pub saved_at: Time,
    /// Configuration in effect, including retuned parameters
    pub config: EvolutionConfig,
    /// Number of completed generations
    pub generation: u64,
    /// Current population, unscored offspring included
    pub population: Vec<Individual<G>>,
    /// Best individual observed so far
    pub best_individual: Option<Individual<G>>,
    /// One entry per completed generation
    pub history: Vec<GenerationStats>,
}

/// Just enough of a checkpoint to identify it.
#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    version: Option<u32>,
}

impl<G> Checkpoint<G> {
    /// Snapshot the given state under the current schema.
    pub fn new(
        config: EvolutionConfig,
        generation: u64,
        population: Vec<Individual<G>>,
        best_individual: Option<Individual<G>>,
        history: Vec<GenerationStats>,
    ) -> Self {
        Self {
            format: CHECKPOINT_FORMAT.to_string(),
            version: CHECKPOINT_VERSION,
            saved_at: chrono::Utc::now(),
            config,
            generation,
            population,
            best_individual,
            history,
        }
    }

    /// Check that the snapshot describes a state the engine can resume.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        self.config
            .validate()
            .map_err(|e| CheckpointError::Inconsistent(format!("config: {}", e)))?;

        if self.history.len() as u64 != self.generation {
            return Err(CheckpointError::Inconsistent(format!(
                "generation is {} but history has {} entries",
                self.generation,
                self.history.len()
            )));
        }

        if let Some((i, stats)) = self
            .history
            .iter()
            .enumerate()
            .find(|(i, stats)| stats.generation != *i as u64)
        {
            return Err(CheckpointError::Inconsistent(format!(
                "history entry {} is labelled generation {}",
                i, stats.generation
            )));
        }

        if !self.population.is_empty() && self.population.len() != self.config.population_size {
            return Err(CheckpointError::Inconsistent(format!(
                "population has {} individuals, config expects {}",
                self.population.len(),
                self.config.population_size
            )));
        }

        Ok(())
    }
}

impl<G: Serialize> Checkpoint<G> {
    /// Encode as pretty JSON.
    pub fn encode(&self) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec_pretty(self).map_err(CheckpointError::Encode)
    }
}

impl<G: DeserializeOwned> Checkpoint<G> {
    /// Decode and validate a checkpoint.
    ///
    /// The header is checked before the body, so a document from another
    /// tool or another schema version is rejected without parsing it.
    pub fn decode(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let header: Header = serde_json::from_slice(bytes)
            .map_err(|e| CheckpointError::Corrupt(e.to_string()))?;

        match header.format.as_deref() {
            Some(CHECKPOINT_FORMAT) => {}
            other => {
                return Err(CheckpointError::Foreign(
                    other.unwrap_or("<missing>").to_string(),
                ))
            }
        }

        match header.version {
            Some(CHECKPOINT_VERSION) => {}
            Some(found) => {
                return Err(CheckpointError::UnsupportedVersion {
                    found,
                    expected: CHECKPOINT_VERSION,
                })
            }
            None => return Err(CheckpointError::Corrupt("missing version".to_string())),
        }

        let checkpoint: Self =
            serde_json::from_slice(bytes).map_err(|e| CheckpointError::Corrupt(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }
}
