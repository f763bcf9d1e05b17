//! Adaptive meta-optimizer - adjusts hyperparameters based on recorded
//! generation performance.

use std::collections::VecDeque;

use async_trait::async_trait;
use echoself_core::{EvolutionParams, MetaOptimizerError, ParamUpdate};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::meta::{MetaOptimizer, MetaStats, PerformanceRecord};

/// Adjustment to a hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAdjustment {
    /// Parameter name
    pub parameter: String,
    /// New value
    pub value: f64,
    /// Reason for adjustment
    pub reason: String,
}

/// Tuning knobs for [`AdaptiveOptimizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptimizerConfig {
    /// Maximum number of records kept
    pub history_limit: usize,
    /// |convergence| below this counts as stagnation
    pub stagnation_threshold: f64,
    /// Diversity below this counts as collapse
    pub low_diversity_threshold: f64,
    /// Convergence above this counts as strong improvement
    pub improvement_threshold: f64,
    /// Multiplier applied to the mutation rate when stagnating
    pub mutation_boost: f64,
    /// Multiplier applied to the mutation rate when improving
    pub mutation_decay: f64,
    /// Lower bound for the mutation rate
    pub min_mutation_rate: f64,
    /// Upper bound for the mutation rate
    pub max_mutation_rate: f64,
    /// Step applied to selection pressure
    pub pressure_step: f64,
    /// Crossover rate the optimizer steers toward
    pub target_crossover_rate: f64,
    /// Maximum crossover change per generation
    pub crossover_step: f64,
}

impl Default for AdaptiveOptimizerConfig {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            stagnation_threshold: 1e-3,
            low_diversity_threshold: 0.1,
            improvement_threshold: 0.05,
            mutation_boost: 1.5,
            mutation_decay: 0.9,
            min_mutation_rate: 0.001,
            max_mutation_rate: 0.5,
            pressure_step: 0.05,
            target_crossover_rate: 0.7,
            crossover_step: 0.05,
        }
    }
}

/// Latest generation's signal extracted from the record history.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Signal {
    convergence_rate: f64,
    diversity: f64,
}

#[derive(Debug, Default)]
struct OptimizerState {
    records: VecDeque<PerformanceRecord>,
    best_fitness: Option<f64>,
    adjustments_made: usize,
    last_adjustments: Vec<StrategyAdjustment>,
}

/// Built-in meta-optimizer driven by convergence and diversity trends.
#[derive(Debug, Default)]
pub struct AdaptiveOptimizer {
    config: AdaptiveOptimizerConfig,
    state: Mutex<OptimizerState>,
}

impl AdaptiveOptimizer {
    /// Create an optimizer with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: AdaptiveOptimizerConfig) -> Self {
        self.config = config;
        self
    }

    fn latest_signal(records: &VecDeque<PerformanceRecord>) -> Option<Signal> {
        let latest = records.iter().map(|r| r.generation).max()?;
        records.iter().find(|r| r.generation == latest).map(|r| Signal {
            convergence_rate: r.convergence_rate,
            diversity: r.diversity_metric,
        })
    }

    /// Analyze the signal and suggest adjustments.
    fn suggest_adjustments(&self, params: &EvolutionParams, signal: Signal) -> Vec<StrategyAdjustment> {
        let cfg = &self.config;
        let mut adjustments = Vec::new();

        let stagnating = signal.convergence_rate.abs() < cfg.stagnation_threshold;
        let collapsed = signal.diversity < cfg.low_diversity_threshold;

        if stagnating || collapsed {
            let base = params.mutation_rate.max(cfg.min_mutation_rate);
            let mutation = (base * cfg.mutation_boost).min(cfg.max_mutation_rate).min(1.0);
            let reason = if collapsed {
                format!("Low diversity ({:.3}), increasing exploration", signal.diversity)
            } else {
                format!("Stagnating convergence ({:+.4}), increasing exploration", signal.convergence_rate)
            };
            push_if_changed(&mut adjustments, "mutation_rate", params.mutation_rate, mutation, &reason);

            let pressure = (params.selection_pressure - cfg.pressure_step).max(0.0);
            push_if_changed(&mut adjustments, "selection_pressure", params.selection_pressure, pressure, &reason);
        } else if signal.convergence_rate > cfg.improvement_threshold {
            let mutation = (params.mutation_rate * cfg.mutation_decay).max(cfg.min_mutation_rate).min(1.0);
            let reason = format!("Strong improvement ({:+.4}), favouring exploitation", signal.convergence_rate);
            push_if_changed(&mut adjustments, "mutation_rate", params.mutation_rate, mutation, &reason);

            let pressure = (params.selection_pressure + cfg.pressure_step).min(1.0);
            push_if_changed(&mut adjustments, "selection_pressure", params.selection_pressure, pressure, &reason);
        }

        let gap = cfg.target_crossover_rate - params.crossover_rate;
        let crossover = params.crossover_rate + gap.clamp(-cfg.crossover_step, cfg.crossover_step);
        push_if_changed(
            &mut adjustments,
            "crossover_rate",
            params.crossover_rate,
            crossover.clamp(0.0, 1.0),
            &format!("Steering crossover toward {:.2}", cfg.target_crossover_rate),
        );

        adjustments
    }

    /// Fold adjustments into a parameter update.
    fn apply_adjustments(adjustments: &[StrategyAdjustment]) -> ParamUpdate {
        let mut update = ParamUpdate::default();
        for adjustment in adjustments {
            match adjustment.parameter.as_str() {
                "mutation_rate" => update.mutation_rate = Some(adjustment.value),
                "selection_pressure" => update.selection_pressure = Some(adjustment.value),
                "crossover_rate" => update.crossover_rate = Some(adjustment.value),
                _ => {}
            }
        }
        update
    }
}

fn push_if_changed(
    adjustments: &mut Vec<StrategyAdjustment>,
    parameter: &str,
    current: f64,
    value: f64,
    reason: &str,
) {
    if (value - current).abs() > f64::EPSILON {
        adjustments.push(StrategyAdjustment {
            parameter: parameter.to_string(),
            value,
            reason: reason.to_string(),
        });
    }
}

#[async_trait]
impl MetaOptimizer for AdaptiveOptimizer {
    async fn optimize(&self, params: &EvolutionParams) -> Result<ParamUpdate, MetaOptimizerError> {
        let mut state = self.state.lock().await;
        let Some(signal) = Self::latest_signal(&state.records) else {
            return Ok(ParamUpdate::default());
        };

        let adjustments = self.suggest_adjustments(params, signal);
        for adjustment in &adjustments {
            debug!("Adjusting {} to {:.4}: {}", adjustment.parameter, adjustment.value, adjustment.reason);
        }

        let update = Self::apply_adjustments(&adjustments);
        state.adjustments_made += adjustments.len();
        state.last_adjustments = adjustments;
        Ok(update)
    }

    async fn record_performance(&self, record: PerformanceRecord) -> Result<(), MetaOptimizerError> {
        for (name, value) in [
            ("fitness", record.fitness),
            ("convergence_rate", record.convergence_rate),
            ("diversity_metric", record.diversity_metric),
        ] {
            if !value.is_finite() {
                return Err(MetaOptimizerError::Rejected(format!("{} is not finite: {}", name, value)));
            }
        }

        let mut state = self.state.lock().await;
        state.best_fitness = Some(match state.best_fitness {
            Some(best) => best.max(record.fitness),
            None => record.fitness,
        });
        state.records.push_back(record);
        while state.records.len() > self.config.history_limit {
            state.records.pop_front();
        }
        Ok(())
    }

    async fn stats(&self) -> MetaStats {
        let state = self.state.lock().await;
        let mut stats = MetaStats::new();
        stats.insert("records".to_string(), serde_json::json!(state.records.len()));
        stats.insert("best_fitness".to_string(), serde_json::json!(state.best_fitness));
        stats.insert("adjustments_made".to_string(), serde_json::json!(state.adjustments_made));
        stats.insert(
            "last_adjustments".to_string(),
            serde_json::to_value(&state.last_adjustments).unwrap_or(serde_json::Value::Null),
        );
        stats
    }
}
