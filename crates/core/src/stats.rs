//! Per-generation statistics and convergence tracking.

use serde::{Deserialize, Serialize};

use crate::Time;

/// Summary of one completed generation. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Index of the generation that was scored (0 for the first step)
    pub generation: u64,

    /// Highest score in the generation
    pub best_fitness: f64,

    /// Arithmetic mean of all scores
    pub average_fitness: f64,

    /// Value of the configured diversity strategy
    pub diversity: f64,

    /// Change in average fitness since the previous generation
    pub convergence_rate: f64,

    /// When the generation completed
    pub recorded_at: Time,
}

impl GenerationStats {
    /// Build stats for a scored generation, given the history recorded so far.
    pub fn from_scores(
        generation: u64,
        scores: &[f64],
        diversity: f64,
        history: &[GenerationStats],
    ) -> Self {
        let average_fitness = average(scores);
        let best_fitness = best_index(scores).map(|i| scores[i]).unwrap_or(0.0);

        Self {
            generation,
            best_fitness,
            average_fitness,
            diversity,
            convergence_rate: convergence_rate(history, average_fitness),
            recorded_at: chrono::Utc::now(),
        }
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn average(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Index of the highest score; the first one wins ties.
pub fn best_index(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some(b) if score <= scores[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// `current_average` minus the previous generation's average.
///
/// 0.0 for the first generation, so a history of fewer than two entries
/// always carries a zero rate.
pub fn convergence_rate(history: &[GenerationStats], current_average: f64) -> f64 {
    match history.last() {
        Some(previous) => current_average - previous.average_fitness,
        None => 0.0,
    }
}
