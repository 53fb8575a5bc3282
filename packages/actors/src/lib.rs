//! A minimal actor runtime built on Tokio.
//!
//! Actors are isolated tasks that only talk through asynchronous messages.
//! Each actor owns a bounded mailbox and a stack of behaviors, can spawn
//! children that are stopped with it, and can be monitored for termination.
//!
//! # Architecture
//!
//! - `ActorSystem` - Creates top-level actors and coordinates shutdown
//! - `Actor` - Cheap, cloneable handle used to message and control an actor
//! - `ActorContext` - Per-actor engine handed to behaviors
//! - `ForwardingActor` - Rebroadcasts messages to a mutable recipient set
//!
//! # Usage
//!
//! ```ignore
//! use actors::{ActorSystem, Behavior, msg};
//!
//! let system = ActorSystem::new("demo")?;
//! let echo = system.spawn_with_name("echo", Behavior::new(|message, ctx| {
//!     tracing::info!("{} received {:?}", ctx.name(), message);
//! }))?;
//! echo.send(msg!["hello"]);
//! system.graceful_shutdown().await;
//! ```

mod actor;
mod behavior;
mod context;
mod control;
mod error;
mod forward;
mod message;
mod names;
mod registry;
mod system;

pub use actor::Actor;
pub use behavior::Behavior;
pub use context::ActorContext;
pub use error::{ActorError, ActorResult};
pub use forward::ForwardingActor;
pub use message::{Down, Message, Tag, Value};
pub use registry::RegistrySnapshot;
pub use system::ActorSystem;

/// Re-export core types for convenience.
pub use actor_core::{
    ActorEvent, ActorId, ActorPath, ActorStatus, CoreError, StopCause, SystemConfig,
};

/// Build an application [`Message`] from a list of values.
///
/// Every element goes through `Value::from`, so strings, integers, booleans,
/// JSON values and actor handles can be mixed freely.
#[macro_export]
macro_rules! msg {
    () => {
        $crate::Message::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Message::new(vec![$($crate::Value::from($value)),+])
    };
}
