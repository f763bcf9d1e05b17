//! External context providers and environment construction.

use std::sync::Arc;

use async_trait::async_trait;
use echoself_core::{ContextError, ContextSnapshot, Environment, EvaluationError, IndividualId};

/// Read-only view into an external subsystem (reservoir, orchestrator, ...).
///
/// Queried once per individual per generation while its environment is
/// built. A failure fails that individual's evaluation only.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Key under which the snapshot appears in the environment.
    fn name(&self) -> &str;

    /// Fetch the current snapshot.
    async fn get_context(&self) -> Result<ContextSnapshot, ContextError>;
}

/// Provider that always returns the same snapshot.
#[derive(Debug, Clone)]
pub struct StaticContext {
    name: String,
    snapshot: ContextSnapshot,
}

impl StaticContext {
    /// Create a provider for a fixed snapshot.
    pub fn new(name: impl Into<String>, snapshot: ContextSnapshot) -> Self {
        Self {
            name: name.into(),
            snapshot,
        }
    }
}

#[async_trait]
impl ContextProvider for StaticContext {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_context(&self) -> Result<ContextSnapshot, ContextError> {
        Ok(self.snapshot.clone())
    }
}

/// Build the environment for one individual.
pub(crate) async fn build_environment(
    generation: u64,
    individual_id: IndividualId,
    providers: &[Arc<dyn ContextProvider>],
) -> Result<Environment, EvaluationError> {
    let mut environment = Environment::new(generation, individual_id);
    for provider in providers {
        let snapshot = provider.get_context().await.map_err(|source| EvaluationError::Context {
            provider: provider.name().to_string(),
            source,
        })?;
        environment = environment.with_context(provider.name(), snapshot);
    }
    Ok(environment)
}
