//! Error type for runtime operations.

use actor_core::CoreError;

/// Result type for runtime operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Error type for runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Cannot unbecome the original behavior of {0}")]
    BehaviorStackUnderflow(String),

    #[error("Actor path already in use: {0}")]
    DuplicateName(String),

    #[error("Actor stopped: {0}")]
    ActorStopped(String),
}
