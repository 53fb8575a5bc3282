//! The actor system: root of the actor tree.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use actor_core::{ActorEvent, ActorPath, SystemConfig};
use tokio::sync::broadcast;

use crate::context::ActorContext;
use crate::error::ActorResult;
use crate::forward::{ForwardingActor, broadcast_behavior};
use crate::names::{NameReservation, NameTable};
use crate::registry::{ActorKind, Registry, RegistrySnapshot, Signal};
use crate::{Actor, Behavior};

struct SystemInner {
    name: String,
    root: ActorPath,
    config: SystemConfig,
    registry: Registry,
    events: broadcast::Sender<ActorEvent>,
    /// Local names of live top-level actors and relays.
    names: Arc<NameTable>,
}

/// Creates top-level actors, tracks every actor it owns and coordinates
/// shutdown of the whole tree.
///
/// Cloning the system is cheap; clones share the same registry.
#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl ActorSystem {
    /// Create a system with the default configuration.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn new(name: impl Into<String>) -> ActorResult<Self> {
        Self::with_config(name, SystemConfig::default())
    }

    /// Create a system with the given configuration.
    pub fn with_config(name: impl Into<String>, config: SystemConfig) -> ActorResult<Self> {
        let name = name.into();
        let root = ActorPath::root(&name)?;
        config.validate()?;

        tracing::info!("Starting actor system: {}", name);

        let (events, _) = broadcast::channel(config.event_capacity);
        let registry = Registry::start(name.clone(), events.clone());

        Ok(Self {
            inner: Arc::new(SystemInner {
                name,
                root,
                config,
                registry,
                events,
                names: NameTable::new(),
            }),
        })
    }

    /// Name of the system, the first segment of every path.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Configuration shared by every actor.
    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    /// Path of the system itself, `/<name>`.
    pub fn root_path(&self) -> &ActorPath {
        &self.inner.root
    }

    /// Spawn a top-level actor with a synthesized numeric name.
    ///
    /// Numbers already taken by explicitly named actors are skipped.
    pub fn spawn(&self, behavior: Behavior) -> ActorResult<Actor> {
        let name = self.inner.names.reserve_next(&self.inner.root)?;
        Ok(self.spawn_top_level(name, behavior))
    }

    /// Spawn a top-level actor at `/<system>/<name>`.
    ///
    /// The actor is registered before its start signal is released. Fails
    /// with [`ActorError::DuplicateName`](crate::ActorError::DuplicateName)
    /// while another live actor holds the same path.
    pub fn spawn_with_name(&self, name: &str, behavior: Behavior) -> ActorResult<Actor> {
        let name = self.inner.names.reserve(&self.inner.root, name)?;
        Ok(self.spawn_top_level(name, behavior))
    }

    fn spawn_top_level(&self, name: NameReservation, behavior: Behavior) -> Actor {
        ActorContext::build(self, name, ActorKind::TopLevel, behavior, None, None).start()
    }

    /// Spawn a top-level forwarding actor with an initial recipient set.
    pub fn spawn_forward_actor(
        &self,
        name: &str,
        recipients: impl IntoIterator<Item = Actor>,
    ) -> ActorResult<ForwardingActor> {
        let name = self.inner.names.reserve(&self.inner.root, name)?;
        Ok(ForwardingActor::spawn(
            self,
            name,
            ActorKind::TopLevel,
            recipients,
            broadcast_behavior(),
        ))
    }

    /// Subscribe to lifecycle events of every actor in the system.
    pub fn subscribe(&self) -> broadcast::Receiver<ActorEvent> {
        self.inner.events.subscribe()
    }

    /// Point-in-time view of the running and stopped actors.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.inner.registry.snapshot().await
    }

    /// Paths of every actor that has not stopped yet.
    pub async fn running(&self) -> Vec<ActorPath> {
        self.snapshot().await.running
    }

    /// Paths of every actor that has stopped.
    pub async fn stopped(&self) -> Vec<ActorPath> {
        self.snapshot().await.stopped
    }

    /// Wait until every actor of the system, descendants and monitor relays
    /// included, has stopped.
    pub async fn wait_for_all_actors_stopped(&self) {
        self.inner.registry.await_all_stopped().await;
    }

    /// Kill every top-level actor and wait for the whole tree to stop.
    pub async fn shutdown_now(&self) {
        self.shutdown_now_in(Duration::ZERO).await;
    }

    /// Like [`shutdown_now`](Self::shutdown_now), after waiting `delay`.
    pub async fn shutdown_now_in(&self, delay: Duration) {
        self.shutdown(Signal::Kill, delay).await;
    }

    /// Terminate every top-level actor and wait for the whole tree to stop.
    pub async fn graceful_shutdown(&self) {
        self.graceful_shutdown_in(Duration::ZERO).await;
    }

    /// Like [`graceful_shutdown`](Self::graceful_shutdown), after waiting `delay`.
    pub async fn graceful_shutdown_in(&self, delay: Duration) {
        self.shutdown(Signal::Terminate, delay).await;
    }

    async fn shutdown(&self, signal: Signal, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let signaled = self.inner.registry.signal(signal).await;
        tracing::info!(
            "Shutting down actor system {} ({:?}, {} actors signaled)",
            self.name(),
            signal,
            signaled
        );
        self.wait_for_all_actors_stopped().await;
        tracing::info!("Actor system {} stopped", self.name());
    }

    pub(crate) fn names(&self) -> &Arc<NameTable> {
        &self.inner.names
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .finish()
    }
}
