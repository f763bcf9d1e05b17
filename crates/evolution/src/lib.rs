//! Evolution layer - generic evolutionary optimization with adaptive
//! hyperparameter control.
//!
//! The [`EvolutionEngine`] evolves a population of [`Individual`]s over
//! caller-defined genomes. Each step runs:
//!
//! ```text
//! Retune (meta-optimizer) → Evaluate (concurrent) → Report → Select & Reproduce → Record
//! ```

#![warn(missing_docs, unused_crate_dependencies)]

mod error;
mod observer;
mod context;
mod meta;
mod optimizer;
mod metrics;
mod evaluation;
mod reproduction;
mod checkpoint;
mod engine;

pub use error::{CheckpointError, EvolutionError, Result};
pub use observer::{EvolutionObserver, MetaStage, TracingObserver};
pub use context::{ContextProvider, StaticContext};
pub use meta::{MetaOptimizer, MetaStats, PerformanceRecord, ReservoirBridge, ReservoirMetrics};
pub use optimizer::{AdaptiveOptimizer, AdaptiveOptimizerConfig, StrategyAdjustment};
pub use metrics::{ConstantDiversity, DiversityMetric, FitnessSpread, PairwiseDistance};
pub use reproduction::{next_generation, tournament_select, TOURNAMENT_SIZE};
pub use checkpoint::{Checkpoint, CHECKPOINT_FORMAT, CHECKPOINT_VERSION};
pub use engine::{EngineStatistics, EvolutionEngine, IntegrationStatus, RunSummary, StopReason};

pub use echoself_core::{
    EvolutionConfig, EvolutionParams, Environment, GenerationStats, Genome, Individual,
    IndividualId, ParamUpdate,
};
