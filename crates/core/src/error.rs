//! Error types shared across the engine and its collaborators.

/// Invalid configuration or engine state that makes a step impossible.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Population size of zero
    #[error("population size must be positive")]
    InvalidPopulationSize,

    /// A fractional hyperparameter outside [0, 1]
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfRange {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// A real-valued parameter that is NaN or infinite
    #[error("{name} must be finite, got {value}")]
    NotFinite {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// `evolve_step` called before `initialize_population`
    #[error("population not initialized")]
    EmptyPopulation,
}

/// Failure of a context provider to produce its snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    /// The provider's backing subsystem is unreachable
    #[error("context unavailable: {0}")]
    Unavailable(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure while scoring one individual. Always recovered by the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// The genome's own evaluation failed
    #[error("evaluation failed: {0}")]
    Failed(String),

    /// The evaluation environment could not be built
    #[error("context provider '{provider}' failed: {source}")]
    Context {
        /// Name of the failing provider
        provider: String,
        /// Underlying provider error
        #[source]
        source: ContextError,
    },

    /// The genome returned NaN or an infinite score
    #[error("evaluation produced a non-finite score: {0}")]
    NonFinite(f64),

    /// The evaluation task panicked or was aborted
    #[error("evaluation task did not complete")]
    Aborted,
}

impl EvaluationError {
    /// Shorthand for [`EvaluationError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Failure of the meta-learning collaborator. Always recovered by the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetaOptimizerError {
    /// The collaborator call failed
    #[error("meta-optimizer call failed: {0}")]
    Failed(String),

    /// The collaborator refused a performance record
    #[error("performance record rejected: {0}")]
    Rejected(String),

    /// Applying the returned parameters would produce an invalid config
    #[error("retuned parameters are invalid: {0}")]
    InvalidUpdate(#[from] ConfigurationError),
}

impl MetaOptimizerError {
    /// Shorthand for [`MetaOptimizerError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_messages() {
        let err = ConfigurationError::OutOfRange { name: "elitism_ratio", value: 1.5 };
        assert_eq!(err.to_string(), "elitism_ratio must be within [0, 1], got 1.5");
        assert_eq!(ConfigurationError::EmptyPopulation.to_string(), "population not initialized");
    }

    #[test]
    fn test_context_error_is_source_of_evaluation_error() {
        use std::error::Error;

        let err = EvaluationError::Context {
            provider: "reservoir".to_string(),
            source: ContextError::Unavailable("offline".to_string()),
        };
        assert!(err.to_string().contains("reservoir"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_invalid_update_wraps_configuration_error() {
        let err: MetaOptimizerError = ConfigurationError::InvalidPopulationSize.into();
        assert!(matches!(err, MetaOptimizerError::InvalidUpdate(_)));
    }
}
