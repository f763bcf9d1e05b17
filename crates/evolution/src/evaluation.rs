//! Concurrent fitness evaluation stage.

use std::sync::Arc;

use echoself_core::{EvaluationError, Genome, Individual, IndividualId};
use tokio::task::JoinSet;
use tracing::debug;

use crate::context::{build_environment, ContextProvider};

/// Scores of one evaluation stage, in population order.
#[derive(Debug)]
pub(crate) struct EvaluationOutcome {
    /// One score per individual, input order
    pub scores: Vec<f64>,
    /// Recovered failures: population index, individual, error
    pub failures: Vec<(usize, IndividualId, EvaluationError)>,
}

/// Evaluate every individual concurrently and join them all.
///
/// Each individual runs in its own task on a [`JoinSet`]; dropping the
/// returned future aborts every task still in flight. Failed, panicked and
/// non-finite evaluations score 0.0 and are listed in `failures`.
pub(crate) async fn evaluate_population<G: Genome>(
    population: &[Individual<G>],
    generation: u64,
    providers: &[Arc<dyn ContextProvider>],
) -> EvaluationOutcome {
    let mut tasks = JoinSet::new();

    for (index, individual) in population.iter().enumerate() {
        let genome = individual.shared_genome();
        let id = individual.id();
        let providers = providers.to_vec();
        tasks.spawn(async move {
            let result = evaluate_one(genome, generation, id, &providers).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<f64, EvaluationError>>> =
        (0..population.len()).map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => debug!("Evaluation task ended without a result: {}", e),
        }
    }

    let mut scores = Vec::with_capacity(population.len());
    let mut failures = Vec::new();

    for (index, (individual, result)) in population.iter().zip(results).enumerate() {
        let result = result.unwrap_or(Err(EvaluationError::Aborted));
        match result {
            Ok(score) => scores.push(score),
            Err(error) => {
                scores.push(0.0);
                failures.push((index, individual.id(), error));
            }
        }
    }

    EvaluationOutcome { scores, failures }
}

async fn evaluate_one<G: Genome>(
    genome: Arc<G>,
    generation: u64,
    id: IndividualId,
    providers: &[Arc<dyn ContextProvider>],
) -> Result<f64, EvaluationError> {
    let environment = build_environment(generation, id, providers).await?;
    let score = genome.evaluate(&environment).await?;
    if !score.is_finite() {
        return Err(EvaluationError::NonFinite(score));
    }
    Ok(score)
}
