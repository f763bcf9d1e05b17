//! Meta-learning collaborator interfaces.

use std::collections::BTreeMap;

use async_trait::async_trait;
use echoself_core::{ArchitectureParams, EvolutionParams, MetaOptimizerError, ParamUpdate};
use serde::{Deserialize, Serialize};

/// Free-form telemetry returned by `MetaOptimizer::stats`.
pub type MetaStats = BTreeMap<String, serde_json::Value>;

/// Metrics and configuration exchanged with the reservoir subsystem.
pub type ReservoirMetrics = BTreeMap<String, serde_json::Value>;

/// Performance of one top individual in one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Architecture parameters extracted from the genome
    pub architecture_params: ArchitectureParams,
    /// Score the individual received
    pub fitness: f64,
    /// Generation that was scored
    pub generation: u64,
    /// Convergence rate of that generation
    pub convergence_rate: f64,
    /// Diversity of that generation
    pub diversity_metric: f64,
}

/// Adaptive controller that retunes the engine's hyperparameters.
#[async_trait]
pub trait MetaOptimizer: Send + Sync {
    /// Propose new values for the retunable parameters. May be partial.
    async fn optimize(&self, params: &EvolutionParams) -> Result<ParamUpdate, MetaOptimizerError>;

    /// Ingest one performance record.
    async fn record_performance(&self, record: PerformanceRecord) -> Result<(), MetaOptimizerError>;

    /// Current learning statistics.
    async fn stats(&self) -> MetaStats;
}

/// Bridge to the membrane/reservoir (DTESN) subsystem.
///
/// Only consulted when a meta-optimizer is also configured: after the
/// top-performer records, the engine reports one reservoir record per
/// generation.
#[async_trait]
pub trait ReservoirBridge: Send + Sync {
    /// Current reservoir performance metrics.
    async fn metrics(&self) -> Result<ReservoirMetrics, MetaOptimizerError>;

    /// Current reservoir configuration.
    async fn config(&self) -> Result<ReservoirMetrics, MetaOptimizerError>;

    /// Record the reservoir's configuration and metrics for a generation.
    async fn record_performance(
        &self,
        config: &ReservoirMetrics,
        metrics: &ReservoirMetrics,
        generation: u64,
    ) -> Result<(), MetaOptimizerError>;
}
