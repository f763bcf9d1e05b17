//! Individuals and the genome capability contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::error::EvaluationError;
use crate::id::IndividualId;

/// Architecture-level parameters a genome exposes to the meta-learning loop.
pub type ArchitectureParams = BTreeMap<String, serde_json::Value>;

/// Caller-defined candidate representation.
///
/// The engine never looks inside a genome; it only scores, mutates and
/// recombines it through this trait. Implementations must not modify
/// `self` in `mutate` or `crossover`.
#[async_trait]
pub trait Genome: Sized + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Score this genome in the given environment.
    async fn evaluate(&self, environment: &Environment) -> Result<f64, EvaluationError>;

    /// Produce a perturbed copy. `rate` is a probability-like strength.
    fn mutate(&self, rate: f64, rng: &mut dyn RngCore) -> Self;

    /// Produce exactly two children from `self` and `other`.
    fn crossover(&self, other: &Self, rng: &mut dyn RngCore) -> (Self, Self);

    /// Architecture parameters reported to the meta-optimizer.
    fn architecture_params(&self) -> ArchitectureParams {
        ArchitectureParams::new()
    }
}

/// A candidate solution: a genome plus the engine's bookkeeping about it.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual<G> {
    id: IndividualId,
    genome: Arc<G>,
    fitness: f64,
    age: u32,
    performance_history: Vec<f64>,
}

impl<G> Clone for Individual<G> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            genome: Arc::clone(&self.genome),
            fitness: self.fitness,
            age: self.age,
            performance_history: self.performance_history.clone(),
        }
    }
}

impl<G> Individual<G> {
    /// Wrap a freshly created genome.
    pub fn new(genome: G) -> Self {
        Self {
            id: IndividualId::new(),
            genome: Arc::new(genome),
            fitness: 0.0,
            age: 0,
            performance_history: Vec::new(),
        }
    }

    /// Stable identity token.
    pub fn id(&self) -> IndividualId {
        self.id
    }

    /// The wrapped genome.
    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Shared handle to the genome, for evaluation tasks.
    pub fn shared_genome(&self) -> Arc<G> {
        Arc::clone(&self.genome)
    }

    /// Latest fitness (0.0 until first scored).
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Number of generations this individual has been scored in.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Every score this individual has received, oldest first.
    pub fn performance_history(&self) -> &[f64] {
        &self.performance_history
    }

    /// Record a new score: sets fitness, appends to history and ages by one.
    pub fn record_fitness(&mut self, score: f64) {
        self.fitness = score;
        self.performance_history.push(score);
        self.age = self.age.saturating_add(1);
    }
}

impl<G: Genome> Individual<G> {
    /// Score this individual. Does not record the result.
    pub async fn evaluate(&self, environment: &Environment) -> Result<f64, EvaluationError> {
        self.genome.evaluate(environment).await
    }

    /// New individual from a mutated copy of this genome.
    pub fn mutate(&self, rate: f64, rng: &mut dyn RngCore) -> Self {
        Self::new(self.genome.mutate(rate, rng))
    }

    /// Two new individuals recombined from `self` and `other`.
    pub fn crossover(&self, other: &Self, rng: &mut dyn RngCore) -> (Self, Self) {
        let (a, b) = self.genome.crossover(&other.genome, rng);
        (Self::new(a), Self::new(b))
    }

    /// Architecture parameters for meta-learning.
    ///
    /// Falls back to `{fitness, age, genome_size}` when the genome exposes
    /// nothing, with `genome_size` the length of its JSON encoding.
    pub fn architecture_params(&self) -> ArchitectureParams {
        let params = self.genome.architecture_params();
        if !params.is_empty() {
            return params;
        }

        let genome_size = serde_json::to_string(self.genome.as_ref())
            .map(|s| s.len())
            .unwrap_or(0);

        let mut fallback = ArchitectureParams::new();
        fallback.insert("fitness".to_string(), serde_json::json!(self.fitness));
        fallback.insert("age".to_string(), serde_json::json!(self.age));
        fallback.insert("genome_size".to_string(), serde_json::json!(genome_size));
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Scalar(f64);

    #[async_trait]
    impl Genome for Scalar {
        async fn evaluate(&self, _environment: &Environment) -> Result<f64, EvaluationError> {
            Ok(self.0)
        }

        fn mutate(&self, rate: f64, rng: &mut dyn RngCore) -> Self {
            Scalar(self.0 + rate * rng.gen_range(-1.0..1.0))
        }

        fn crossover(&self, other: &Self, _rng: &mut dyn RngCore) -> (Self, Self) {
            let mid = (self.0 + other.0) / 2.0;
            (Scalar(mid), Scalar(mid))
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Layered {
        layer_count: u32,
    }

    #[async_trait]
    impl Genome for Layered {
        async fn evaluate(&self, _environment: &Environment) -> Result<f64, EvaluationError> {
            Ok(self.layer_count as f64)
        }

        fn mutate(&self, _rate: f64, _rng: &mut dyn RngCore) -> Self {
            self.clone()
        }

        fn crossover(&self, other: &Self, _rng: &mut dyn RngCore) -> (Self, Self) {
            (self.clone(), other.clone())
        }

        fn architecture_params(&self) -> ArchitectureParams {
            let mut params = ArchitectureParams::new();
            params.insert("layer_count".to_string(), serde_json::json!(self.layer_count));
            params
        }
    }

    #[test]
    fn test_new_individual_defaults() {
        let individual = Individual::new(Scalar(1.0));
        assert_eq!(individual.fitness(), 0.0);
        assert_eq!(individual.age(), 0);
        assert!(individual.performance_history().is_empty());
    }

    #[test]
    fn test_record_fitness_appends_history() {
        let mut individual = Individual::new(Scalar(1.0));
        individual.record_fitness(0.4);
        individual.record_fitness(0.7);
        assert_eq!(individual.fitness(), 0.7);
        assert_eq!(individual.performance_history(), &[0.4, 0.7]);
        assert_eq!(individual.age(), 2);
    }

    #[test]
    fn test_mutate_leaves_parent_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let parent = Individual::new(Scalar(1.0));
        let child = parent.mutate(0.5, &mut rng);

        assert_eq!(parent.genome(), &Scalar(1.0));
        assert_ne!(child.id(), parent.id());
        assert_eq!(child.age(), 0);
    }

    #[test]
    fn test_crossover_yields_two_new_individuals() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = Individual::new(Scalar(0.0));
        let b = Individual::new(Scalar(2.0));
        let (c, d) = a.crossover(&b, &mut rng);

        assert_eq!(c.genome(), &Scalar(1.0));
        assert_eq!(d.genome(), &Scalar(1.0));
        assert_ne!(c.id(), d.id());
        assert_eq!(a.genome(), &Scalar(0.0));
        assert_eq!(b.genome(), &Scalar(2.0));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let individual = Individual::new(Scalar(3.0));
        let copy = individual.clone();
        assert_eq!(copy.id(), individual.id());
        assert_eq!(copy, individual);
    }

    #[tokio::test]
    async fn test_evaluate_delegates_to_genome() {
        let individual = Individual::new(Scalar(0.25));
        let environment = Environment::new(0, individual.id());
        assert_eq!(individual.evaluate(&environment).await.unwrap(), 0.25);
    }

    #[test]
    fn test_architecture_params_from_genome() {
        let individual = Individual::new(Layered { layer_count: 6 });
        let params = individual.architecture_params();
        assert_eq!(params.get("layer_count"), Some(&serde_json::json!(6)));
        assert!(!params.contains_key("genome_size"));
    }

    #[test]
    fn test_architecture_params_fallback() {
        let mut individual = Individual::new(Scalar(1.5));
        individual.record_fitness(0.5);
        let params = individual.architecture_params();
        assert_eq!(params.get("fitness"), Some(&serde_json::json!(0.5)));
        assert_eq!(params.get("age"), Some(&serde_json::json!(1)));
        assert_eq!(params.get("genome_size"), Some(&serde_json::json!("1.5".len())));
    }
}
