//! The evolution engine - runs the generational loop.

use std::sync::Arc;

use echoself_core::{
    best_index, ConfigurationError, EvolutionConfig, GenerationStats, Genome, Individual,
    MetaOptimizerError,
};
use echoself_storage::CheckpointStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checkpoint::Checkpoint;
use crate::context::ContextProvider;
use crate::error::Result;
use crate::evaluation::evaluate_population;
use crate::meta::{MetaOptimizer, MetaStats, PerformanceRecord, ReservoirBridge};
use crate::metrics::{ConstantDiversity, DiversityMetric};
use crate::observer::{EvolutionObserver, MetaStage, TracingObserver};
use crate::reproduction::{fittest_indices, next_generation};

/// Number of top performers reported to the meta-optimizer per generation.
const META_TOP_PERFORMERS: usize = 5;

/// Why [`EvolutionEngine::run`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_generations` generations have completed
    MaxGenerations,
    /// A generation's best fitness reached `fitness_threshold`
    FitnessThreshold,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps completed by this call
    pub generations_run: u64,
    /// Generation counter when the run stopped
    pub final_generation: u64,
    /// Why the run stopped
    pub stop_reason: StopReason,
    /// Fitness of the best individual of the last generation
    pub best_fitness: f64,
}

/// Which optional collaborators are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStatus {
    /// A meta-optimizer retunes parameters
    pub meta_learning_enabled: bool,
    /// A reservoir bridge receives per-generation records
    pub reservoir_enabled: bool,
    /// Names of registered context providers, in registration order
    pub context_providers: Vec<String>,
}

/// Snapshot of the engine for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatistics {
    /// Completed generations
    pub generation: u64,
    /// Current population size
    pub population_size: usize,
    /// Fitness of the best individual of the last generation
    pub best_fitness: f64,
    /// Per-generation statistics
    pub history: Vec<GenerationStats>,
    /// Configuration in effect
    pub config: EvolutionConfig,
    /// Attached collaborators
    pub integration: IntegrationStatus,
    /// Meta-optimizer telemetry, when one is attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_learning: Option<MetaStats>,
}

/// Generational evolutionary optimizer over a caller-defined genome.
///
/// Each [`evolve_step`](Self::evolve_step) runs:
/// ```text
/// Retune → Evaluate → Record → Report → Select & Reproduce → Commit
/// ```
/// Engine state only changes at the commit point, so a step that fails or
/// is dropped mid-flight leaves the engine as it was.
pub struct EvolutionEngine<G: Genome> {
    config: EvolutionConfig,
    population: Vec<Individual<G>>,
    generation: u64,
    best_individual: Option<Individual<G>>,
    history: Vec<GenerationStats>,
    rng: StdRng,
    observer: Arc<dyn EvolutionObserver>,
    diversity: Box<dyn DiversityMetric<G>>,
    meta_optimizer: Option<Arc<dyn MetaOptimizer>>,
    reservoir: Option<Arc<dyn ReservoirBridge>>,
    context_providers: Vec<Arc<dyn ContextProvider>>,
}

impl<G: Genome> EvolutionEngine<G> {
    /// Create an engine with an empty population.
    pub fn new(config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            population: Vec::new(),
            generation: 0,
            best_individual: None,
            history: Vec::new(),
            rng,
            observer: Arc::new(TracingObserver),
            diversity: Box::new(ConstantDiversity::default()),
            meta_optimizer: None,
            reservoir: None,
            context_providers: Vec::new(),
        })
    }

    /// Set the observability sink.
    pub fn with_observer(mut self, observer: Arc<dyn EvolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the diversity strategy.
    pub fn with_diversity_metric(mut self, metric: impl DiversityMetric<G> + 'static) -> Self {
        self.diversity = Box::new(metric);
        self
    }

    /// Attach a meta-optimizer.
    pub fn with_meta_optimizer(mut self, optimizer: Arc<dyn MetaOptimizer>) -> Self {
        info!("Meta-learning integration enabled");
        self.meta_optimizer = Some(optimizer);
        self
    }

    /// Attach a reservoir bridge. Only used alongside a meta-optimizer.
    pub fn with_reservoir_bridge(mut self, bridge: Arc<dyn ReservoirBridge>) -> Self {
        info!("Reservoir integration enabled");
        self.reservoir = Some(bridge);
        self
    }

    /// Register a context provider.
    pub fn with_context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        info!("Context provider '{}' registered", provider.name());
        self.context_providers.push(provider);
        self
    }

    /// Replace the population with `population_size` individuals from `factory`.
    pub fn initialize_population<F>(&mut self, mut factory: F) -> Result<()>
    where
        F: FnMut() -> Individual<G>,
    {
        if self.config.population_size == 0 {
            return Err(ConfigurationError::InvalidPopulationSize.into());
        }

        self.population = (0..self.config.population_size).map(|_| factory()).collect();
        info!("Population initialized with {} individuals", self.population.len());
        Ok(())
    }

    /// Run one generation.
    pub async fn evolve_step(&mut self) -> Result<GenerationStats> {
        if self.population.is_empty() {
            return Err(ConfigurationError::EmptyPopulation.into());
        }

        let generation = self.generation;
        let mut config = self.config.clone();

        // 1. Retune
        if generation > 0 {
            self.retune(&mut config, generation).await;
        }

        // 2. Evaluate
        let outcome = evaluate_population(&self.population, generation, &self.context_providers).await;
        for (_, id, error) in &outcome.failures {
            self.observer.evaluation_failed(generation, *id, error);
        }

        // 3. Record
        let mut scored = self.population.clone();
        for (individual, &score) in scored.iter_mut().zip(&outcome.scores) {
            individual.record_fitness(score);
        }

        let best_individual = best_index(&outcome.scores).map(|i| scored[i].clone());
        let diversity = self.diversity.measure(&scored);
        let stats = GenerationStats::from_scores(generation, &outcome.scores, diversity, &self.history);

        // 4. Report
        if self.meta_optimizer.is_some() {
            self.report_performance(&scored, &stats).await;
        }

        // 5. Select & reproduce
        let next = next_generation(&scored, &config, &mut self.rng);
        debug!("Generation {}: {} offspring produced", generation, next.len());

        // 6. Commit
        self.config = config;
        self.population = next;
        self.best_individual = best_individual;
        self.history.push(stats.clone());
        self.generation += 1;

        self.observer.generation_completed(&stats);
        Ok(stats)
    }

    /// Step until `max_generations` is reached or the fitness threshold is met.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let start = self.generation;
        info!(
            "Starting evolution at generation {} (max {}, threshold {})",
            start, self.config.max_generations, self.config.fitness_threshold
        );

        let stop_reason = loop {
            if self.generation >= self.config.max_generations {
                break StopReason::MaxGenerations;
            }
            let stats = self.evolve_step().await?;
            if stats.best_fitness >= self.config.fitness_threshold {
                break StopReason::FitnessThreshold;
            }
        };

        let summary = RunSummary {
            generations_run: self.generation - start,
            final_generation: self.generation,
            stop_reason,
            best_fitness: self.best_fitness(),
        };
        info!(
            "Evolution stopped after {} generations ({:?}), best fitness {:.4}",
            summary.generations_run, summary.stop_reason, summary.best_fitness
        );
        Ok(summary)
    }

    async fn retune(&self, config: &mut EvolutionConfig, generation: u64) {
        let Some(meta) = &self.meta_optimizer else {
            return;
        };

        let before = config.params();
        let update = match meta.optimize(&before).await {
            Ok(update) => update,
            Err(e) => {
                self.observer.meta_optimizer_failed(generation, MetaStage::Optimize, &e);
                return;
            }
        };

        if update.is_empty() {
            return;
        }

        match config.apply(&update) {
            Ok(()) => self.observer.parameters_retuned(generation, &before, &config.params()),
            Err(e) => {
                let error = MetaOptimizerError::from(e);
                self.observer.meta_optimizer_failed(generation, MetaStage::Optimize, &error);
            }
        }
    }

    async fn report_performance(&self, scored: &[Individual<G>], stats: &GenerationStats) {
        let Some(meta) = &self.meta_optimizer else {
            return;
        };

        for index in fittest_indices(scored, META_TOP_PERFORMERS) {
            let individual = &scored[index];
            let record = PerformanceRecord {
                architecture_params: individual.architecture_params(),
                fitness: individual.fitness(),
                generation: stats.generation,
                convergence_rate: stats.convergence_rate,
                diversity_metric: stats.diversity,
            };
            if let Err(e) = meta.record_performance(record).await {
                self.observer
                    .meta_optimizer_failed(stats.generation, MetaStage::RecordPerformance, &e);
            }
        }

        if let Some(reservoir) = &self.reservoir {
            let recorded = async {
                let metrics = reservoir.metrics().await?;
                let config = reservoir.config().await?;
                reservoir.record_performance(&config, &metrics, stats.generation).await
            };
            if let Err(e) = recorded.await {
                self.observer
                    .meta_optimizer_failed(stats.generation, MetaStage::RecordReservoir, &e);
            }
        }
    }

    /// Configuration in effect, including retuned parameters.
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Current population.
    pub fn population(&self) -> &[Individual<G>] {
        &self.population
    }

    /// Number of completed generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Best individual of the last completed generation.
    pub fn best_individual(&self) -> Option<&Individual<G>> {
        self.best_individual.as_ref()
    }

    /// Best fitness of the last completed generation, 0.0 before the first.
    pub fn best_fitness(&self) -> f64 {
        self.best_individual.as_ref().map_or(0.0, |b| b.fitness())
    }

    /// One entry per completed generation.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Which collaborators are attached.
    pub fn integration_status(&self) -> IntegrationStatus {
        IntegrationStatus {
            meta_learning_enabled: self.meta_optimizer.is_some(),
            reservoir_enabled: self.reservoir.is_some(),
            context_providers: self.context_providers.iter().map(|p| p.name().to_string()).collect(),
        }
    }

    /// Reporting snapshot, including meta-optimizer telemetry.
    pub async fn statistics(&self) -> EngineStatistics {
        let meta_learning = match &self.meta_optimizer {
            Some(meta) => Some(meta.stats().await),
            None => None,
        };

        EngineStatistics {
            generation: self.generation,
            population_size: self.population.len(),
            best_fitness: self.best_fitness(),
            history: self.history.clone(),
            config: self.config.clone(),
            integration: self.integration_status(),
            meta_learning,
        }
    }

    /// Snapshot the full engine state.
    pub fn checkpoint(&self) -> Checkpoint<G> {
        Checkpoint::new(
            self.config.clone(),
            self.generation,
            self.population.clone(),
            self.best_individual.clone(),
            self.history.clone(),
        )
    }

    /// Replace the full engine state. Nothing changes if the snapshot is invalid.
    pub fn restore(&mut self, checkpoint: Checkpoint<G>) -> Result<()> {
        checkpoint.validate()?;

        self.config = checkpoint.config;
        self.generation = checkpoint.generation;
        self.population = checkpoint.population;
        self.best_individual = checkpoint.best_individual;
        self.history = checkpoint.history;
        Ok(())
    }

    /// Write a checkpoint to `store` at `location`.
    pub async fn save_checkpoint(&self, store: &dyn CheckpointStore, location: &str) -> Result<()> {
        let blob = self.checkpoint().encode()?;
        store.write(location, &blob).await?;
        info!("Checkpoint saved to {} (generation {})", location, self.generation);
        Ok(())
    }

    /// Replace the engine state with the checkpoint at `location`.
    ///
    /// Missing, corrupt, foreign or inconsistent checkpoints fail and leave
    /// the engine untouched.
    pub async fn load_checkpoint(&mut self, store: &dyn CheckpointStore, location: &str) -> Result<()> {
        let blob = store.read(location).await?;
        let checkpoint = Checkpoint::decode(&blob)?;
        self.restore(checkpoint)?;
        info!("Checkpoint loaded from {} (generation {})", location, self.generation);
        Ok(())
    }
}
