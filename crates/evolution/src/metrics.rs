//! Population diversity strategies.

use echoself_core::Individual;

/// Measures how varied a scored population is.
pub trait DiversityMetric<G>: Send + Sync {
    /// Diversity of `population`; larger means more varied.
    fn measure(&self, population: &[Individual<G>]) -> f64;
}

/// Fixed value regardless of population. The engine's default (0.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDiversity(pub f64);

impl Default for ConstantDiversity {
    fn default() -> Self {
        Self(0.5)
    }
}

impl<G> DiversityMetric<G> for ConstantDiversity {
    fn measure(&self, _population: &[Individual<G>]) -> f64 {
        self.0
    }
}

/// Standard deviation of the population's fitness values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitnessSpread;

impl<G> DiversityMetric<G> for FitnessSpread {
    fn measure(&self, population: &[Individual<G>]) -> f64 {
        if population.len() < 2 {
            return 0.0;
        }
        let n = population.len() as f64;
        let mean = population.iter().map(|i| i.fitness()).sum::<f64>() / n;
        let variance = population
            .iter()
            .map(|i| (i.fitness() - mean).powi(2))
            .sum::<f64>()
            / n;
        variance.sqrt()
    }
}

/// Mean pairwise genome distance under a caller-supplied distance function.
pub struct PairwiseDistance<F> {
    distance: F,
}

impl<F> PairwiseDistance<F> {
    /// Wrap a genome distance function.
    pub fn new(distance: F) -> Self {
        Self { distance }
    }
}

impl<G, F> DiversityMetric<G> for PairwiseDistance<F>
where
    F: Fn(&G, &G) -> f64 + Send + Sync,
{
    fn measure(&self, population: &[Individual<G>]) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, a) in population.iter().enumerate() {
            for b in &population[i + 1..] {
                total += (self.distance)(a.genome(), b.genome());
                pairs += 1;
            }
        }
        if pairs == 0 { 0.0 } else { total / pairs as f64 }
    }
}
