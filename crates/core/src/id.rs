//! Unique identifiers for Echo-Self entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Stable identity token for an individual.
///
/// Assigned once at creation and carried unchanged through evaluation,
/// elitism and checkpointing. Offspring always receive a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(Ulid);

impl IndividualId {
    /// Generate a new IndividualId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for IndividualId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IndividualId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for IndividualId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = IndividualId::new();
        let b = IndividualId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_parse_round_trip() {
        let id = IndividualId::new();
        let parsed: IndividualId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-ulid".parse::<IndividualId>().is_err());
    }
}
