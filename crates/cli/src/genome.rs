//! Benchmark genome for the demo binary.

use async_trait::async_trait;
use echoself_core::{Environment, EvaluationError, Genome};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Largest perturbation applied to a mutated gene.
const MUTATION_STEP: f64 = 0.5;

/// Real-valued vector scored on the sphere function.
///
/// Fitness is `1 / (1 + Σ x²)`: 1.0 at the origin, approaching 0.0 far away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorGenome {
    genes: Vec<f64>,
}

impl VectorGenome {
    /// Uniform random genes in `[-bound, bound]`.
    pub fn random(dimensions: usize, bound: f64, rng: &mut dyn RngCore) -> Self {
        let genes = (0..dimensions).map(|_| rng.gen_range(-bound..=bound)).collect();
        Self { genes }
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    fn sphere(&self) -> f64 {
        1.0 / (1.0 + self.genes.iter().map(|x| x * x).sum::<f64>())
    }
}

#[async_trait]
impl Genome for VectorGenome {
    async fn evaluate(&self, _environment: &Environment) -> Result<f64, EvaluationError> {
        if self.genes.iter().any(|x| !x.is_finite()) {
            return Err(EvaluationError::failed("non-finite gene"));
        }
        Ok(self.sphere())
    }

    fn mutate(&self, rate: f64, rng: &mut dyn RngCore) -> Self {
        let genes = self
            .genes
            .iter()
            .map(|&x| {
                if rng.gen::<f64>() < rate {
                    x + rng.gen_range(-MUTATION_STEP..=MUTATION_STEP)
                } else {
                    x
                }
            })
            .collect();
        Self { genes }
    }

    fn crossover(&self, other: &Self, rng: &mut dyn RngCore) -> (Self, Self) {
        let len = self.genes.len().min(other.genes.len());
        if len < 2 {
            return (self.clone(), other.clone());
        }

        // Single-point
        let cut = rng.gen_range(1..len);
        let mut a = self.genes[..cut].to_vec();
        a.extend_from_slice(&other.genes[cut..]);
        let mut b = other.genes[..cut].to_vec();
        b.extend_from_slice(&self.genes[cut..]);
        (Self { genes: a }, Self { genes: b })
    }
}
