//! Observability sink injected into the engine.

use echoself_core::{EvaluationError, EvolutionParams, GenerationStats, IndividualId, MetaOptimizerError};
use tracing::{debug, error, info, warn};

/// Which meta-learning call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaStage {
    /// Hyperparameter retuning before evaluation
    Optimize,
    /// Reporting a top performer's record
    RecordPerformance,
    /// Reporting the reservoir record
    RecordReservoir,
}

impl MetaStage {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimize => "optimize",
            Self::RecordPerformance => "record_performance",
            Self::RecordReservoir => "record_reservoir",
        }
    }
}

/// Receives the events the engine recovers from or reports.
///
/// Called from the engine's control thread only, never from evaluation
/// tasks.
pub trait EvolutionObserver: Send + Sync {
    /// An individual's evaluation failed and was scored 0.0.
    fn evaluation_failed(&self, generation: u64, individual: IndividualId, error: &EvaluationError);

    /// A meta-learning call failed and was skipped.
    fn meta_optimizer_failed(&self, generation: u64, stage: MetaStage, error: &MetaOptimizerError);

    /// Hyperparameters were retuned before a generation.
    fn parameters_retuned(&self, _generation: u64, _before: &EvolutionParams, _after: &EvolutionParams) {}

    /// A generation completed and its stats were recorded.
    fn generation_completed(&self, _stats: &GenerationStats) {}
}

/// Default sink: forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EvolutionObserver for TracingObserver {
    fn evaluation_failed(&self, generation: u64, individual: IndividualId, error: &EvaluationError) {
        error!("Generation {}: error evaluating individual {}: {}", generation, individual, error);
    }

    fn meta_optimizer_failed(&self, generation: u64, stage: MetaStage, error: &MetaOptimizerError) {
        warn!("Generation {}: meta-optimizer {} failed: {}", generation, stage.as_str(), error);
    }

    fn parameters_retuned(&self, generation: u64, before: &EvolutionParams, after: &EvolutionParams) {
        debug!(
            "Generation {}: retuned mutation {:.4} -> {:.4}, pressure {:.4} -> {:.4}, crossover {:.4} -> {:.4}",
            generation,
            before.mutation_rate, after.mutation_rate,
            before.selection_pressure, after.selection_pressure,
            before.crossover_rate, after.crossover_rate,
        );
    }

    fn generation_completed(&self, stats: &GenerationStats) {
        info!(
            "Generation {}: Best={:.4}, Avg={:.4}, Diversity={:.4}, Convergence={:+.4}",
            stats.generation, stats.best_fitness, stats.average_fitness, stats.diversity, stats.convergence_rate,
        );
    }
}
