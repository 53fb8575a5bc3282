//! Runtime tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Configuration shared by every actor of a system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Capacity of each actor's bounded mailbox.
    pub mailbox_capacity: usize,
    /// How long an idle actor waits before re-polling its event sources (milliseconds).
    pub receive_timeout_ms: u64,
    /// Number of lifecycle events buffered for slow subscribers.
    pub event_capacity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 100,
            receive_timeout_ms: 10,
            event_capacity: 1024,
        }
    }
}

impl SystemConfig {
    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the mailbox capacity.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Set the receive timeout.
    ///
    /// The value is stored in whole milliseconds: a non-zero timeout below
    /// one millisecond rounds up to one, and anything past `u64::MAX`
    /// milliseconds saturates.
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.receive_timeout_ms = if millis == 0 && !timeout.is_zero() {
            1
        } else {
            millis
        };
        self
    }

    /// Set the lifecycle event buffer size.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Idle interval of the event loop as a [`Duration`].
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Check that every knob is usable.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.mailbox_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "mailbox_capacity must be greater than zero".into(),
            ));
        }
        if self.receive_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "receive_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "event_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
