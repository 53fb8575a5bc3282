//! Actor identifiers.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an actor, using ULID so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub Ulid);

impl ActorId {
    /// Create a new unique actor ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse an actor ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
