//! Lifecycle events published by an actor system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, ActorPath, StopCause};

/// Events emitted by the runtime as actors move through their lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActorEvent {
    /// An actor received its start signal and began processing.
    Started {
        actor_id: ActorId,
        path: ActorPath,
        timestamp: DateTime<Utc>,
    },
    /// An actor reached its terminal state.
    Stopped {
        actor_id: ActorId,
        path: ActorPath,
        cause: StopCause,
        timestamp: DateTime<Utc>,
    },
    /// A behavior panicked while handling a message. The actor keeps running.
    BehaviorFailed {
        actor_id: ActorId,
        path: ActorPath,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl ActorEvent {
    /// Get the ID of the actor the event is about.
    pub fn actor_id(&self) -> ActorId {
        match self {
            ActorEvent::Started { actor_id, .. } => *actor_id,
            ActorEvent::Stopped { actor_id, .. } => *actor_id,
            ActorEvent::BehaviorFailed { actor_id, .. } => *actor_id,
        }
    }

    /// Get the path of the actor the event is about.
    pub fn path(&self) -> &ActorPath {
        match self {
            ActorEvent::Started { path, .. } => path,
            ActorEvent::Stopped { path, .. } => path,
            ActorEvent::BehaviorFailed { path, .. } => path,
        }
    }

    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ActorEvent::Started { timestamp, .. } => *timestamp,
            ActorEvent::Stopped { timestamp, .. } => *timestamp,
            ActorEvent::BehaviorFailed { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    #[test]
    fn serializes_with_event_tag() -> Result<(), CoreError> {
        let event = ActorEvent::Stopped {
            actor_id: ActorId::new(),
            path: ActorPath::root("sys")?.child("worker")?,
            cause: StopCause::Killed,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["event"], "stopped");
        assert_eq!(json["cause"], "killed");
        assert_eq!(json["path"], "/sys/worker");

        let back: ActorEvent = serde_json::from_value(json)?;
        assert_eq!(back, event);
        Ok(())
    }
}
