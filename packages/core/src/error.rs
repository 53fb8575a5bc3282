//! Errors raised while building core values.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid actor name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
