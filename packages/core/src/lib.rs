//! Core domain types for the actor runtime.
//!
//! This crate contains the plain types shared by the runtime and its users:
//! - `ActorId` and `ActorPath` for actor identity
//! - `ActorStatus` and `StopCause` for the lifecycle state machine
//! - `ActorEvent` for lifecycle notifications
//! - `SystemConfig` for tuning mailboxes and the receive tick

mod config;
mod error;
mod events;
mod id;
mod path;
mod status;

pub use config::SystemConfig;
pub use error::CoreError;
pub use events::ActorEvent;
pub use id::ActorId;
pub use path::ActorPath;
pub use status::{ActorStatus, StopCause};
