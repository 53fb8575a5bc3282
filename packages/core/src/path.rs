//! Hierarchical actor names.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Canonical path of an actor, e.g. `/system/parent/child`.
///
/// The first segment is always the name of the owning actor system. Paths are
/// unique within a system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorPath(String);

impl ActorPath {
    /// Path of the actor system itself (`/<system>`).
    pub fn root(system: &str) -> Result<Self, CoreError> {
        validate_segment(system)?;
        Ok(Self(format!("/{}", system)))
    }

    /// Path of a direct child of this path.
    pub fn child(&self, local: &str) -> Result<Self, CoreError> {
        validate_segment(local)?;
        Ok(Self(format!("{}/{}", self.0, local)))
    }

    /// The full path, e.g. `/system/parent/child`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the owning actor system.
    pub fn system_name(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Last segment of the path.
    pub fn local_name(&self) -> &str {
        self.segments().next_back().unwrap_or_default()
    }

    /// Number of segments below the system root (top-level actors have depth 1).
    pub fn depth(&self) -> usize {
        self.segments().count().saturating_sub(1)
    }

    /// Whether `self` is a strict descendant of `other`.
    pub fn is_descendant_of(&self, other: &ActorPath) -> bool {
        self.0.len() > other.0.len()
            && self.0.starts_with(&other.0)
            && self.0.as_bytes()[other.0.len()] == b'/'
    }

    /// Local name for the monitor relay of the actor at this path.
    ///
    /// `/sys/a/b` becomes `a-b-monitor`, which is a valid single segment.
    pub fn relay_name(&self) -> String {
        let below_root: Vec<&str> = self.segments().skip(1).collect();
        format!("{}-monitor", below_root.join("-"))
    }

    fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for ActorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActorPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate_segment(name: &str) -> Result<(), CoreError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('/') {
        "name contains '/'"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else {
        return Ok(());
    };
    Err(CoreError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
