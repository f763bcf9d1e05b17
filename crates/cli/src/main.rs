//! Echo-Self CLI - evolutionary optimization demo.

mod genome;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use echoself_evolution::{
    AdaptiveOptimizer, Checkpoint, EvolutionConfig, EvolutionEngine, FitnessSpread, Individual,
    RunSummary,
};
use echoself_storage::{CheckpointStore, FileStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::genome::VectorGenome;

#[derive(Parser)]
#[command(name = "echoself")]
#[command(about = "Evolutionary optimization with adaptive meta-learning", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a fresh population on the sphere benchmark
    Run(RunArgs),
    /// Continue a run from a checkpoint
    Resume {
        /// Checkpoint to resume from
        checkpoint: PathBuf,
        /// Additional generations to run (default: up to the saved max)
        #[arg(long)]
        generations: Option<u64>,
        /// Attach the adaptive meta-optimizer
        #[arg(long)]
        adaptive: bool,
        /// Write the final state here instead of back to the input
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a checkpoint's summary
    Inspect {
        /// Checkpoint to read
        checkpoint: PathBuf,
        /// Print full engine statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON file with an EvolutionConfig
    #[arg(long)]
    config: Option<PathBuf>,
    /// Population size
    #[arg(long)]
    population: Option<usize>,
    /// Maximum generations
    #[arg(long)]
    generations: Option<u64>,
    /// Mutation rate
    #[arg(long)]
    mutation_rate: Option<f64>,
    /// Stop once best fitness reaches this value
    #[arg(long)]
    threshold: Option<f64>,
    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,
    /// Genome dimensions
    #[arg(long, default_value = "8")]
    dimensions: usize,
    /// Initial gene range: [-bound, bound]
    #[arg(long, default_value = "5.0")]
    bound: f64,
    /// Attach the adaptive meta-optimizer
    #[arg(long)]
    adaptive: bool,
    /// Save the final state to this checkpoint
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Resume {
            checkpoint,
            generations,
            adaptive,
            output,
        } => {
            let (store, location) = open_checkpoint(&checkpoint)?;
            let mut saved = read_checkpoint(&store, &location).await?;
            if let Some(extra) = generations {
                saved.config.max_generations = saved.generation + extra;
            }

            let mut engine = build_engine(saved.config.clone(), adaptive)?;
            engine.restore(saved)?;
            info!("Resuming at generation {}", engine.generation());

            let summary = engine.run().await?;
            print_summary(&summary);

            let target = output.unwrap_or(checkpoint);
            let (store, location) = open_checkpoint(&target)?;
            engine.save_checkpoint(&store, &location).await?;
            println!("Checkpoint: {}", target.display());
        }
        Commands::Inspect { checkpoint, json } => {
            let (store, location) = open_checkpoint(&checkpoint)?;
            let saved = read_checkpoint(&store, &location).await?;

            if json {
                let mut engine = build_engine(saved.config.clone(), false)?;
                engine.restore(saved)?;
                let stats = engine.statistics().await;
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("Checkpoint: {}", checkpoint.display());
            println!("  Saved: {}", saved.saved_at);
            println!("  Format: {} v{}", saved.format, saved.version);
            println!("  Generation: {} / {}", saved.generation, saved.config.max_generations);
            println!("  Population: {}", saved.population.len());
            println!(
                "  Rates: mutation {:.4}, crossover {:.4}, pressure {:.4}, elitism {:.4}",
                saved.config.mutation_rate,
                saved.config.crossover_rate,
                saved.config.selection_pressure,
                saved.config.elitism_ratio,
            );
            if let Some(best) = &saved.best_individual {
                println!("  Best: {} fitness {:.6}", best.id(), best.fitness());
                println!("  Genes: {:?}", best.genome().genes());
            }
            if let Some(last) = saved.history.last() {
                println!(
                    "  Last generation: best {:.6}, avg {:.6}, convergence {:+.6}",
                    last.best_fitness, last.average_fitness, last.convergence_rate
                );
            }
        }
    }

    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<EvolutionConfig>(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EvolutionConfig::default(),
    };
    if let Some(size) = args.population {
        config.population_size = size;
    }
    if let Some(max) = args.generations {
        config.max_generations = max;
    }
    if let Some(rate) = args.mutation_rate {
        config.mutation_rate = rate;
    }
    if let Some(threshold) = args.threshold {
        config.fitness_threshold = threshold;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };

    let mut engine = build_engine(config, args.adaptive)?;
    engine.initialize_population(|| {
        Individual::new(VectorGenome::random(args.dimensions, args.bound, &mut rng))
    })?;

    let summary = engine.run().await?;
    print_summary(&summary);

    if let Some(path) = &args.checkpoint {
        let (store, location) = open_checkpoint(path)?;
        engine.save_checkpoint(&store, &location).await?;
        println!("Checkpoint: {}", path.display());
    }

    Ok(())
}

fn build_engine(config: EvolutionConfig, adaptive: bool) -> Result<EvolutionEngine<VectorGenome>> {
    let mut engine = EvolutionEngine::new(config)
        .context("invalid evolution config")?
        .with_diversity_metric(FitnessSpread);
    if adaptive {
        engine = engine.with_meta_optimizer(Arc::new(AdaptiveOptimizer::new()));
    }
    Ok(engine)
}

/// Store rooted at the file's directory, plus the file name as location.
fn open_checkpoint(path: &Path) -> Result<(FileStore, String)> {
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let location = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid checkpoint path {}", path.display()))?
        .to_string();

    Ok((FileStore::new(root), location))
}

async fn read_checkpoint(store: &FileStore, location: &str) -> Result<Checkpoint<VectorGenome>> {
    let blob = store
        .read(location)
        .await
        .with_context(|| format!("failed to read checkpoint {}", location))?;
    Checkpoint::decode(&blob).with_context(|| format!("failed to decode checkpoint {}", location))
}

fn print_summary(summary: &RunSummary) {
    println!("Evolution finished");
    println!("  Stop reason: {:?}", summary.stop_reason);
    println!("  Generations run: {}", summary.generations_run);
    println!("  Final generation: {}", summary.final_generation);
    println!("  Best fitness: {:.6}", summary.best_fitness);
}
