//! Evolution hyperparameters.

use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;

/// Hyperparameter bundle for the evolution engine.
///
/// Held fixed for the duration of one generation. Between generations the
/// meta-learning loop may overwrite `mutation_rate`, `selection_pressure`
/// and `crossover_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Number of individuals in every generation
    pub population_size: usize,

    /// Perturbation strength handed to `Genome::mutate`
    pub mutation_rate: f64,

    /// Reserved selection strength. Carried and retuned by the meta-learning
    /// loop; the size-3 tournament does not consume it.
    pub selection_pressure: f64,

    /// Probability of producing a pair of offspring by crossover
    pub crossover_rate: f64,

    /// Fraction of the population carried over unchanged
    pub elitism_ratio: f64,

    /// Generation count at which `run` stops
    pub max_generations: u64,

    /// Best fitness at which `run` stops early
    pub fitness_threshold: f64,

    /// Seed for the selection/reproduction RNG (None = from entropy)
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            mutation_rate: 0.01,
            selection_pressure: 0.8,
            crossover_rate: 0.7,
            elitism_ratio: 0.1,
            max_generations: 1000,
            fitness_threshold: 0.95,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set selection pressure.
    pub fn with_selection_pressure(mut self, pressure: f64) -> Self {
        self.selection_pressure = pressure;
        self
    }

    /// Set crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Set elitism ratio.
    pub fn with_elitism_ratio(mut self, ratio: f64) -> Self {
        self.elitism_ratio = ratio;
        self
    }

    /// Set generation limit.
    pub fn with_max_generations(mut self, max: u64) -> Self {
        self.max_generations = max;
        self
    }

    /// Set fitness threshold.
    pub fn with_fitness_threshold(mut self, threshold: f64) -> Self {
        self.fitness_threshold = threshold;
        self
    }

    /// Set RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the invariants every generation relies on.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.population_size == 0 {
            return Err(ConfigurationError::InvalidPopulationSize);
        }

        for (name, value) in [
            ("mutation_rate", self.mutation_rate),
            ("selection_pressure", self.selection_pressure),
            ("crossover_rate", self.crossover_rate),
            ("elitism_ratio", self.elitism_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::OutOfRange { name, value });
            }
        }

        if !self.fitness_threshold.is_finite() {
            return Err(ConfigurationError::NotFinite {
                name: "fitness_threshold",
                value: self.fitness_threshold,
            });
        }

        Ok(())
    }

    /// Number of individuals carried over unchanged each generation.
    ///
    /// `floor(population_size × elitism_ratio)`, never above `population_size`.
    pub fn elite_count(&self) -> usize {
        let count = (self.population_size as f64 * self.elitism_ratio).floor();
        if count <= 0.0 {
            0
        } else {
            (count as usize).min(self.population_size)
        }
    }

    /// Snapshot of the tunable parameters handed to the meta-optimizer.
    pub fn params(&self) -> EvolutionParams {
        EvolutionParams {
            mutation_rate: self.mutation_rate,
            selection_pressure: self.selection_pressure,
            crossover_rate: self.crossover_rate,
            population_size: self.population_size,
            elitism_ratio: self.elitism_ratio,
        }
    }

    /// Overwrite the retunable parameters present in `update`.
    ///
    /// The update is applied to a copy first; on validation failure `self`
    /// is left untouched.
    pub fn apply(&mut self, update: &ParamUpdate) -> Result<(), ConfigurationError> {
        let mut next = self.clone();
        if let Some(rate) = update.mutation_rate {
            next.mutation_rate = rate;
        }
        if let Some(pressure) = update.selection_pressure {
            next.selection_pressure = pressure;
        }
        if let Some(rate) = update.crossover_rate {
            next.crossover_rate = rate;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Current hyperparameters as seen by the meta-optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    /// Mutation rate
    pub mutation_rate: f64,
    /// Selection pressure
    pub selection_pressure: f64,
    /// Crossover rate
    pub crossover_rate: f64,
    /// Population size (read-only for the optimizer)
    pub population_size: usize,
    /// Elitism ratio (read-only for the optimizer)
    pub elitism_ratio: f64,
}

/// Partial set of retuned parameters. Missing fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamUpdate {
    /// New mutation rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_rate: Option<f64>,
    /// New selection pressure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_pressure: Option<f64>,
    /// New crossover rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossover_rate: Option<f64>,
}

impl ParamUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.mutation_rate.is_none()
            && self.selection_pressure.is_none()
            && self.crossover_rate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 100);
        assert_eq!(config.elite_count(), 10);
    }

    #[test]
    fn test_elite_count_floors() {
        let config = EvolutionConfig::new().with_population_size(4).with_elitism_ratio(0.25);
        assert_eq!(config.elite_count(), 1);

        let config = EvolutionConfig::new().with_population_size(7).with_elitism_ratio(0.5);
        assert_eq!(config.elite_count(), 3);

        let config = EvolutionConfig::new().with_population_size(5).with_elitism_ratio(1.0);
        assert_eq!(config.elite_count(), 5);

        let config = EvolutionConfig::new().with_population_size(5).with_elitism_ratio(0.0);
        assert_eq!(config.elite_count(), 0);
    }

    #[test]
    fn test_validate_rejects_zero_population() {
        let config = EvolutionConfig::new().with_population_size(0);
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidPopulationSize));
    }

    #[test]
    fn test_validate_rejects_out_of_range_fractions() {
        let config = EvolutionConfig::new().with_elitism_ratio(1.2);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::OutOfRange { name: "elitism_ratio", .. })
        ));

        let config = EvolutionConfig::new().with_crossover_rate(-0.1);
        assert!(config.validate().is_err());

        let config = EvolutionConfig::new().with_mutation_rate(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut config = EvolutionConfig::default();
        let update = ParamUpdate {
            mutation_rate: Some(0.2),
            ..Default::default()
        };
        config.apply(&update).unwrap();
        assert_eq!(config.mutation_rate, 0.2);
        assert_eq!(config.selection_pressure, 0.8);
        assert_eq!(config.crossover_rate, 0.7);
    }

    #[test]
    fn test_apply_invalid_update_leaves_config_untouched() {
        let mut config = EvolutionConfig::default();
        let before = config.clone();
        let update = ParamUpdate {
            mutation_rate: Some(0.3),
            crossover_rate: Some(4.0),
            ..Default::default()
        };
        assert!(config.apply(&update).is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_config_deserializes_with_missing_fields() {
        let config: EvolutionConfig =
            serde_json::from_str(r#"{"population_size": 12, "seed": 7}"#).unwrap();
        assert_eq!(config.population_size, 12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.crossover_rate, 0.7);
    }
}
