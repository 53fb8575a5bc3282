//! Lifecycle state of an actor.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an actor.
///
/// Statuses are ordered; an actor only ever moves forward through them and
/// visits each one at most once.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActorStatus {
    /// Constructed and registered, waiting for its start signal.
    #[default]
    Starting,
    /// Processing control events and messages.
    Running,
    /// Cascading its stop to children and monitors.
    Stopping,
    /// Finished. Terminal.
    Stopped,
}

impl ActorStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: ActorStatus) -> bool {
        next > self
    }

    /// Check if the actor has finished.
    pub fn is_stopped(self) -> bool {
        matches!(self, ActorStatus::Stopped)
    }
}

impl std::fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorStatus::Starting => write!(f, "starting"),
            ActorStatus::Running => write!(f, "running"),
            ActorStatus::Stopping => write!(f, "stopping"),
            ActorStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why an actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// Stopped immediately by `kill`.
    Killed,
    /// Stopped cooperatively by `terminate`.
    Terminated,
}

impl StopCause {
    /// Lower-case name used in logs and serialized events.
    pub fn as_str(self) -> &'static str {
        match self {
            StopCause::Killed => "killed",
            StopCause::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for StopCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward() {
        use ActorStatus::*;
        assert!(Starting.can_advance_to(Running));
        assert!(Running.can_advance_to(Stopping));
        assert!(Stopping.can_advance_to(Stopped));
        assert!(Starting.can_advance_to(Stopped));
        assert!(!Running.can_advance_to(Running));
        assert!(!Stopped.can_advance_to(Running));
        assert!(!Stopping.can_advance_to(Starting));
    }

    #[test]
    fn stop_cause_display() {
        assert_eq!(StopCause::Killed.to_string(), "killed");
        assert_eq!(StopCause::Terminated.to_string(), "terminated");
    }
}
