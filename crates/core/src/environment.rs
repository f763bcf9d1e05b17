//! Evaluation environment handed to each genome.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::IndividualId;

/// Read-only snapshot from one context provider: metric name to value.
pub type ContextSnapshot = BTreeMap<String, serde_json::Value>;

/// Per-individual evaluation environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Generation being evaluated
    pub generation: u64,

    /// Identity of the individual being evaluated
    pub individual_id: IndividualId,

    /// Snapshots keyed by provider name
    pub contexts: BTreeMap<String, ContextSnapshot>,
}

impl Environment {
    /// Create an environment with no external context.
    pub fn new(generation: u64, individual_id: IndividualId) -> Self {
        Self {
            generation,
            individual_id,
            contexts: BTreeMap::new(),
        }
    }

    /// Attach a provider snapshot.
    pub fn with_context(mut self, provider: impl Into<String>, snapshot: ContextSnapshot) -> Self {
        self.contexts.insert(provider.into(), snapshot);
        self
    }

    /// Snapshot from the named provider, if one was attached.
    pub fn context(&self, provider: &str) -> Option<&ContextSnapshot> {
        self.contexts.get(provider)
    }

    /// Single metric from the named provider.
    pub fn metric(&self, provider: &str, metric: &str) -> Option<&serde_json::Value> {
        self.context(provider).and_then(|snapshot| snapshot.get(metric))
    }
}
