//! Membership registry of an actor system.
//!
//! All membership state lives in a single task; contexts and the system talk
//! to it through [`Registry`] messages, so the sets are never shared.

use std::collections::BTreeMap;

use actor_core::{ActorEvent, ActorId, ActorPath, StopCause};
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::control::ControlMessage;

/// How an actor was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActorKind {
    /// Spawned directly on the system.
    TopLevel,
    /// Spawned under another actor; stopped through its parent.
    Child,
    /// Monitor relay; terminated separately on shutdown.
    Relay,
}

/// What the registry knows about a running actor.
pub(crate) struct RegistryEntry {
    pub(crate) id: ActorId,
    pub(crate) path: ActorPath,
    pub(crate) kind: ActorKind,
    pub(crate) control: mpsc::UnboundedSender<ControlMessage>,
}

struct StoppedEntry {
    path: ActorPath,
}

/// Shutdown signal sent to every top-level actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    Kill,
    Terminate,
}

impl Signal {
    fn into_control(self) -> ControlMessage {
        match self {
            Signal::Kill => ControlMessage::Kill,
            Signal::Terminate => ControlMessage::Terminate,
        }
    }
}

pub(crate) enum RegistryMessage {
    Register(RegistryEntry),
    Started {
        id: ActorId,
    },
    Stopped {
        id: ActorId,
        cause: StopCause,
    },
    BehaviorFailed {
        id: ActorId,
        error: String,
    },
    Signal {
        signal: Signal,
        reply: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
    AwaitAllStopped {
        reply: oneshot::Sender<()>,
    },
}

/// Point-in-time view of a system's membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    /// Every actor that has not reached `Stopped`, relays included.
    pub running: Vec<ActorPath>,
    /// Every actor that reached `Stopped`.
    pub stopped: Vec<ActorPath>,
    /// Running actors spawned directly on the system.
    pub top_level: Vec<ActorPath>,
    /// Running monitor relays.
    pub relays: Vec<ActorPath>,
}

impl RegistrySnapshot {
    /// Whether every tracked actor has stopped.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }
}

/// Sending side of the registry task.
#[derive(Clone)]
pub(crate) struct Registry {
    tx: mpsc::UnboundedSender<RegistryMessage>,
}

impl Registry {
    /// Spawn the registry task.
    pub(crate) fn start(system: String, events: broadcast::Sender<ActorEvent>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = RegistryState::new(system, events);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                state.handle(message);
            }
            tracing::debug!("Registry of {} closed", state.system);
        });
        Self { tx }
    }

    pub(crate) fn register(&self, entry: RegistryEntry) {
        self.post(RegistryMessage::Register(entry));
    }

    pub(crate) fn started(&self, id: ActorId) {
        self.post(RegistryMessage::Started { id });
    }

    pub(crate) fn stopped(&self, id: ActorId, cause: StopCause) {
        self.post(RegistryMessage::Stopped { id, cause });
    }

    pub(crate) fn behavior_failed(&self, id: ActorId, error: String) {
        self.post(RegistryMessage::BehaviorFailed { id, error });
    }

    /// Signal every running top-level actor and relay. Returns how many were signaled.
    pub(crate) async fn signal(&self, signal: Signal) -> usize {
        let (reply, rx) = oneshot::channel();
        self.post(RegistryMessage::Signal { signal, reply });
        rx.await.unwrap_or_default()
    }

    pub(crate) async fn snapshot(&self) -> RegistrySnapshot {
        let (reply, rx) = oneshot::channel();
        self.post(RegistryMessage::Snapshot { reply });
        rx.await.unwrap_or_default()
    }

    /// Resolve once no tracked actor is running.
    pub(crate) async fn await_all_stopped(&self) {
        let (reply, rx) = oneshot::channel();
        self.post(RegistryMessage::AwaitAllStopped { reply });
        let _ = rx.await;
    }

    fn post(&self, message: RegistryMessage) {
        if self.tx.send(message).is_err() {
            tracing::warn!("Registry task is gone");
        }
    }
}

struct RegistryState {
    system: String,
    /// Running and stopped are disjoint; every registered actor is in exactly one.
    running: BTreeMap<ActorId, RegistryEntry>,
    stopped: BTreeMap<ActorId, StoppedEntry>,
    /// Signal of an ongoing shutdown, replayed to late registrations.
    shutting_down: Option<Signal>,
    waiters: Vec<oneshot::Sender<()>>,
    events: broadcast::Sender<ActorEvent>,
}

impl RegistryState {
    fn new(system: String, events: broadcast::Sender<ActorEvent>) -> Self {
        Self {
            system,
            running: BTreeMap::new(),
            stopped: BTreeMap::new(),
            shutting_down: None,
            waiters: Vec::new(),
            events,
        }
    }

    fn handle(&mut self, message: RegistryMessage) {
        match message {
            RegistryMessage::Register(entry) => self.register(entry),

            RegistryMessage::Started { id } => {
                if let Some(entry) = self.running.get(&id) {
                    self.publish(ActorEvent::Started {
                        actor_id: id,
                        path: entry.path.clone(),
                        timestamp: Utc::now(),
                    });
                }
            }

            RegistryMessage::Stopped { id, cause } => self.stopped(id, cause),

            RegistryMessage::BehaviorFailed { id, error } => {
                if let Some(entry) = self.running.get(&id) {
                    self.publish(ActorEvent::BehaviorFailed {
                        actor_id: id,
                        path: entry.path.clone(),
                        error,
                        timestamp: Utc::now(),
                    });
                }
            }

            RegistryMessage::Signal { signal, reply } => {
                let signaled = self.signal(signal);
                let _ = reply.send(signaled);
            }

            RegistryMessage::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            RegistryMessage::AwaitAllStopped { reply } => {
                if self.running.is_empty() {
                    let _ = reply.send(());
                } else {
                    self.waiters.push(reply);
                }
            }
        }
    }

    fn register(&mut self, entry: RegistryEntry) {
        if let Some(signal) = self.shutting_down {
            tracing::debug!("Stopping {} spawned during shutdown", entry.path);
            let _ = entry.control.send(signal.into_control());
        }
        self.running.insert(entry.id, entry);
    }

    fn stopped(&mut self, id: ActorId, cause: StopCause) {
        let Some(entry) = self.running.remove(&id) else {
            tracing::warn!("Stop reported for untracked actor {} in {}", id, self.system);
            return;
        };

        self.publish(ActorEvent::Stopped {
            actor_id: id,
            path: entry.path.clone(),
            cause,
            timestamp: Utc::now(),
        });
        self.stopped.insert(id, StoppedEntry { path: entry.path });

        if self.running.is_empty() {
            for waiter in self.waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    fn signal(&mut self, signal: Signal) -> usize {
        self.shutting_down = Some(signal);

        let mut signaled = 0;
        for entry in self.running.values() {
            let control = match (entry.kind, signal) {
                (ActorKind::TopLevel, signal) => signal.into_control(),
                (ActorKind::Relay, _) => ControlMessage::Terminate,
                // Children stop through their parent's cascade.
                (ActorKind::Child, _) => continue,
            };
            if entry.control.send(control).is_ok() {
                signaled += 1;
            }
        }
        signaled
    }

    fn snapshot(&self) -> RegistrySnapshot {
        let running_of = |kind: ActorKind| -> Vec<ActorPath> {
            self.running
                .values()
                .filter(|e| e.kind == kind)
                .map(|e| e.path.clone())
                .collect()
        };
        RegistrySnapshot {
            running: self.running.values().map(|e| e.path.clone()).collect(),
            stopped: self.stopped.values().map(|e| e.path.clone()).collect(),
            top_level: running_of(ActorKind::TopLevel),
            relays: running_of(ActorKind::Relay),
        }
    }

    fn publish(&self, event: ActorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        name: &str,
        kind: ActorKind,
    ) -> (RegistryEntry, mpsc::UnboundedReceiver<ControlMessage>) {
        let (control, rx) = mpsc::unbounded_channel();
        let path = ActorPath::root("sys")
            .and_then(|root| root.child(name))
            .expect("valid test path");
        (
            RegistryEntry {
                id: ActorId::new(),
                path,
                kind,
                control,
            },
            rx,
        )
    }

    fn state() -> RegistryState {
        let (events, _) = broadcast::channel(16);
        RegistryState::new("sys".to_string(), events)
    }

    #[test]
    fn stop_moves_actor_between_sets_once() {
        let mut state = state();
        let (a, _rx) = entry("a", ActorKind::TopLevel);
        let id = a.id;
        state.register(a);
        assert_eq!(state.snapshot().running.len(), 1);

        state.stopped(id, StopCause::Terminated);
        state.stopped(id, StopCause::Killed);

        let snapshot = state.snapshot();
        assert!(snapshot.is_idle());
        assert_eq!(snapshot.stopped.len(), 1);
        assert!(snapshot.top_level.is_empty());
    }

    #[test]
    fn waiters_fire_when_last_actor_stops() {
        let mut state = state();
        let (a, _rx_a) = entry("a", ActorKind::TopLevel);
        let (b, _rx_b) = entry("b", ActorKind::Child);
        let (a_id, b_id) = (a.id, b.id);
        state.register(a);
        state.register(b);

        let (reply, mut rx) = oneshot::channel();
        state.handle(RegistryMessage::AwaitAllStopped { reply });

        state.stopped(a_id, StopCause::Killed);
        assert!(rx.try_recv().is_err());
        state.stopped(b_id, StopCause::Killed);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn signal_skips_children_and_terminates_relays() {
        let mut state = state();
        let (top, mut top_rx) = entry("top", ActorKind::TopLevel);
        let (child, mut child_rx) = entry("child", ActorKind::Child);
        let (relay, mut relay_rx) = entry("top-monitor", ActorKind::Relay);
        state.register(top);
        state.register(child);
        state.register(relay);

        assert_eq!(state.signal(Signal::Kill), 2);
        assert!(matches!(top_rx.try_recv(), Ok(ControlMessage::Kill)));
        assert!(matches!(relay_rx.try_recv(), Ok(ControlMessage::Terminate)));
        assert!(child_rx.try_recv().is_err());

        let (late, mut late_rx) = entry("late", ActorKind::TopLevel);
        state.register(late);
        assert!(matches!(late_rx.try_recv(), Ok(ControlMessage::Kill)));
    }

    #[test]
    fn late_registrations_get_the_shutdown_signal() {
        let mut state = state();
        assert_eq!(state.signal(Signal::Terminate), 0);

        let (relay, mut relay_rx) = entry("late-monitor", ActorKind::Relay);
        state.register(relay);
        assert!(matches!(relay_rx.try_recv(), Ok(ControlMessage::Terminate)));
    }
}
