//! Echo-Self core data models.
//!
//! This crate defines the fundamental data structures shared by the
//! evolution engine and its collaborators: individuals and the genome
//! contract, the hyperparameter bundle, evaluation environments and
//! per-generation statistics.

#![warn(missing_docs)]

// Core identities
mod id;

// Hyperparameters
mod config;

// Candidates and their evaluation
mod individual;
mod environment;

// Statistics
mod stats;

// Errors
mod error;

// Re-exports
pub use id::*;

pub use config::{EvolutionConfig, EvolutionParams, ParamUpdate};
pub use individual::{ArchitectureParams, Genome, Individual};
pub use environment::{ContextSnapshot, Environment};
pub use stats::{average, best_index, convergence_rate, GenerationStats};
pub use error::{ConfigurationError, ContextError, EvaluationError, MetaOptimizerError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
