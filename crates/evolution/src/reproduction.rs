//! Selection and reproduction stage.

use std::cmp::Ordering;

use echoself_core::{EvolutionConfig, Genome, Individual};
use rand::{Rng, RngCore};

/// Number of draws per tournament.
pub const TOURNAMENT_SIZE: usize = 3;

/// Indices of the `count` fittest individuals, fittest first.
///
/// Stable: among equal fitness (`-0.0 == 0.0` included) the earlier
/// population index wins.
pub(crate) fn fittest_indices<G>(population: &[Individual<G>], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| {
        population[b]
            .fitness()
            .partial_cmp(&population[a].fitness())
            .unwrap_or(Ordering::Equal)
    });
    order.truncate(count);
    order
}

/// Pick the fittest of [`TOURNAMENT_SIZE`] uniform draws with replacement.
///
/// Ties keep the earliest draw. `population` must not be empty.
pub fn tournament_select<'a, G>(population: &'a [Individual<G>], rng: &mut dyn RngCore) -> &'a Individual<G> {
    let mut winner = &population[rng.gen_range(0..population.len())];
    for _ in 1..TOURNAMENT_SIZE {
        let challenger = &population[rng.gen_range(0..population.len())];
        if challenger.fitness() > winner.fitness() {
            winner = challenger;
        }
    }
    winner
}

/// Build the next generation from a scored population.
///
/// Elites are carried over as-is (same identity). Remaining slots are filled
/// by tournament-selected parents, either recombined (with probability
/// `crossover_rate`, when two slots remain) or mutated independently. A
/// single remaining slot takes a mutant of the first parent.
pub fn next_generation<G: Genome>(
    population: &[Individual<G>],
    config: &EvolutionConfig,
    rng: &mut dyn RngCore,
) -> Vec<Individual<G>> {
    let target = config.population_size;
    if population.is_empty() {
        return Vec::new();
    }

    let mut next: Vec<Individual<G>> = Vec::with_capacity(target + 1);
    for index in fittest_indices(population, config.elite_count()) {
        next.push(population[index].clone());
    }

    while next.len() < target {
        let parent1 = tournament_select(population, rng);
        let parent2 = tournament_select(population, rng);

        if next.len() < target - 1 {
            if rng.gen::<f64>() < config.crossover_rate {
                let (a, b) = parent1.crossover(parent2, rng);
                next.push(a);
                next.push(b);
            } else {
                next.push(parent1.mutate(config.mutation_rate, rng));
                next.push(parent2.mutate(config.mutation_rate, rng));
            }
        } else {
            next.push(parent1.mutate(config.mutation_rate, rng));
        }
    }

    next.truncate(target);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use echoself_core::{Environment, EvaluationError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;

    /// Genome recording how it was produced.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Origin {
        Seed(f64),
        Mutant,
        Child,
    }

    #[async_trait]
    impl Genome for Origin {
        async fn evaluate(&self, _environment: &Environment) -> Result<f64, EvaluationError> {
            Ok(0.0)
        }

        fn mutate(&self, _rate: f64, _rng: &mut dyn RngCore) -> Self {
            Origin::Mutant
        }

        fn crossover(&self, _other: &Self, _rng: &mut dyn RngCore) -> (Self, Self) {
            (Origin::Child, Origin::Child)
        }
    }

    fn scored(fitness: &[f64]) -> Vec<Individual<Origin>> {
        fitness
            .iter()
            .map(|&f| {
                let mut individual = Individual::new(Origin::Seed(f));
                individual.record_fitness(f);
                individual
            })
            .collect()
    }

    #[test]
    fn test_fittest_indices_stable_on_ties() {
        let population = scored(&[0.5, 0.9, 0.5, 0.9, 0.1]);
        assert_eq!(fittest_indices(&population, 3), vec![1, 3, 0]);
        assert!(fittest_indices(&population, 0).is_empty());
    }

    #[test]
    fn test_signed_zeros_tie_in_population_order() {
        let population = scored(&[-0.0, 0.0]);
        assert_eq!(fittest_indices(&population, 1), vec![0]);

        let scores: Vec<f64> = population.iter().map(|i| i.fitness()).collect();
        assert_eq!(echoself_core::best_index(&scores), Some(0));
    }

    #[test]
    fn test_single_elite_carried_by_identity() {
        let population = scored(&[0.9, 0.1, 0.5, 0.3]);
        let config = EvolutionConfig::new().with_population_size(4).with_elitism_ratio(0.25);
        let mut rng = StdRng::seed_from_u64(7);

        let next = next_generation(&population, &config, &mut rng);

        assert_eq!(next.len(), 4);
        assert_eq!(next[0], population[0]);
        let carried: Vec<_> = next.iter().filter(|i| matches!(i.genome(), Origin::Seed(_))).collect();
        assert_eq!(carried.len(), 1);
        assert!(next[1..].iter().all(|i| i.age() == 0));
    }

    #[test]
    fn test_elites_are_the_fittest() {
        let population = scored(&[0.2, 0.8, 0.4, 0.6, 0.1, 0.7, 0.3, 0.5, 0.0, 0.9]);
        let config = EvolutionConfig::new().with_population_size(10).with_elitism_ratio(0.3);
        let mut rng = StdRng::seed_from_u64(11);

        let next = next_generation(&population, &config, &mut rng);
        let next_ids: HashSet<_> = next.iter().map(|i| i.id()).collect();

        for index in [9, 1, 5] {
            assert!(next_ids.contains(&population[index].id()));
        }
        assert_eq!(next.len(), 10);
    }

    #[test]
    fn test_no_crossover_when_rate_is_zero() {
        let population = scored(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let config = EvolutionConfig::new()
            .with_population_size(6)
            .with_elitism_ratio(0.0)
            .with_crossover_rate(0.0);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..20 {
            let next = next_generation(&population, &config, &mut rng);
            assert!(next.iter().all(|i| *i.genome() == Origin::Mutant));
        }
    }

    #[test]
    fn test_always_crossover_when_rate_is_one() {
        let population = scored(&[0.1, 0.2, 0.3, 0.4]);
        let config = EvolutionConfig::new()
            .with_population_size(4)
            .with_elitism_ratio(0.0)
            .with_crossover_rate(1.0);
        let mut rng = StdRng::seed_from_u64(5);

        let next = next_generation(&population, &config, &mut rng);
        assert!(next.iter().all(|i| *i.genome() == Origin::Child));
    }

    #[test]
    fn test_odd_remaining_slot_gets_single_mutant() {
        // Two elites leave three slots: one pair plus a lone mutant.
        let population = scored(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        let config = EvolutionConfig::new()
            .with_population_size(5)
            .with_elitism_ratio(0.4)
            .with_crossover_rate(1.0);
        let mut rng = StdRng::seed_from_u64(9);

        let next = next_generation(&population, &config, &mut rng);
        assert_eq!(next.len(), 5);
        let children = next.iter().filter(|i| *i.genome() == Origin::Child).count();
        let mutants = next.iter().filter(|i| *i.genome() == Origin::Mutant).count();
        assert_eq!(children, 2);
        assert_eq!(mutants, 1);
    }

    #[test]
    fn test_full_elitism_copies_population() {
        let population = scored(&[0.3, 0.1, 0.2]);
        let config = EvolutionConfig::new().with_population_size(3).with_elitism_ratio(1.0);
        let mut rng = StdRng::seed_from_u64(1);

        let next = next_generation(&population, &config, &mut rng);
        let ids: Vec<_> = next.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![population[0].id(), population[2].id(), population[1].id()]);
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let population = scored(&[0.0, 1.0]);
        let mut rng = StdRng::seed_from_u64(42);

        let wins = (0..200)
            .filter(|_| tournament_select(&population, &mut rng).fitness() == 1.0)
            .count();
        // P(best in 3 draws) = 1 - 0.5^3 = 0.875
        assert!(wins > 150, "fitter individual won only {wins} of 200");
    }

    #[test]
    fn test_tournament_single_individual() {
        let population = scored(&[0.4]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(tournament_select(&population, &mut rng).id(), population[0].id());
    }
}
