//! The per-actor execution engine.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use actor_core::{ActorId, ActorStatus, StopCause};
use tokio::sync::{mpsc, oneshot, watch};

use crate::actor::ActorCell;
use crate::behavior::BehaviorStack;
use crate::control::ControlMessage;
use crate::error::{ActorError, ActorResult};
use crate::forward::ForwardingActor;
use crate::names::{NameReservation, NameTable};
use crate::registry::{ActorKind, RegistryEntry};
use crate::{Actor, ActorSystem, Behavior, Message};

/// Start signal: `Ok` runs the actor, `Err` stops it unstarted with that cause.
type StartSignal = Result<(), StopCause>;

/// A built actor whose task is waiting for its start signal.
///
/// Dropping it without calling [`PendingStart::start`] stops the actor before
/// it processes anything.
pub(crate) struct PendingStart {
    actor: Actor,
    start: oneshot::Sender<StartSignal>,
}

impl PendingStart {
    pub(crate) fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Release the start signal.
    pub(crate) fn start(self) -> Actor {
        let _ = self.start.send(Ok(()));
        self.actor
    }

    /// Stop the actor before it runs, reporting `cause`.
    pub(crate) fn cancel(self, cause: StopCause) {
        let _ = self.start.send(Err(cause));
    }
}

/// Execution engine of a single actor, handed to its behaviors.
///
/// The context owns everything private to the actor: the mailbox, the
/// behavior stack, the children it spawned and its monitor relay. Only the
/// actor's own task ever touches it.
pub struct ActorContext {
    myself: Actor,
    behaviors: BehaviorStack,
    mailbox: mpsc::Receiver<Message>,
    control: mpsc::UnboundedReceiver<ControlMessage>,
    /// Upward channel used only to report `ChildStopped`.
    parent: Option<mpsc::WeakUnboundedSender<ControlMessage>>,
    children: BTreeMap<ActorId, Actor>,
    monitor: Option<ForwardingActor>,
    /// Recipient set; present only on forwarding actors.
    recipients: Option<BTreeMap<ActorId, Actor>>,
    status: watch::Sender<ActorStatus>,
    /// Claim on this actor's path, released when it stops.
    reservation: NameReservation,
}

impl ActorContext {
    /// Construct an actor, register it with the system and park its task on
    /// the start signal.
    pub(crate) fn build(
        system: &ActorSystem,
        reservation: NameReservation,
        kind: ActorKind,
        behavior: Behavior,
        parent: Option<mpsc::WeakUnboundedSender<ControlMessage>>,
        recipients: Option<BTreeMap<ActorId, Actor>>,
    ) -> PendingStart {
        let config = system.config();
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let (mailbox_tx, mailbox_rx) = mpsc::channel(config.mailbox_capacity);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ActorStatus::Starting);
        let (start_tx, start_rx) = oneshot::channel();

        let id = ActorId::new();
        let path = reservation.path().clone();
        system.registry().register(RegistryEntry {
            id,
            path: path.clone(),
            kind,
            control: control_tx.clone(),
        });

        let myself = Actor::from_cell(ActorCell {
            id,
            path,
            system: system.clone(),
            intake: intake_tx,
            control: control_tx,
            status: status_rx,
            children: NameTable::new(),
        });

        let context = ActorContext {
            myself: myself.clone(),
            behaviors: BehaviorStack::new(behavior),
            mailbox: mailbox_rx,
            control: control_rx,
            parent,
            children: BTreeMap::new(),
            monitor: None,
            recipients,
            status: status_tx,
            reservation,
        };

        tokio::spawn(pump_mailbox(intake_rx, mailbox_tx));
        tokio::spawn(context.run(start_rx));

        PendingStart {
            actor: myself,
            start: start_tx,
        }
    }

    /// Handle to the actor this context drives.
    pub fn myself(&self) -> &Actor {
        &self.myself
    }

    /// Canonical path of the actor.
    pub fn name(&self) -> &str {
        self.myself.name()
    }

    /// The system this actor belongs to.
    pub fn system(&self) -> &ActorSystem {
        self.myself.system()
    }

    /// Switch to `behavior` for subsequent messages.
    ///
    /// With `discard_old` the current behavior is replaced; otherwise the new
    /// behavior is pushed on top and [`unbecome`](Self::unbecome) returns to
    /// the current one.
    pub fn become_behavior(&mut self, behavior: Behavior, discard_old: bool) {
        self.behaviors.become_behavior(behavior, discard_old);
    }

    /// Return to the previous behavior.
    ///
    /// The behavior at the bottom of the stack is never popped: at depth one
    /// this logs a warning, leaves the stack as it is and returns
    /// [`ActorError::BehaviorStackUnderflow`].
    pub fn unbecome(&mut self) -> ActorResult<()> {
        if self.behaviors.unbecome() {
            Ok(())
        } else {
            tracing::warn!("Unbecome called on {} with a single behavior", self.name());
            Err(ActorError::BehaviorStackUnderflow(self.name().to_string()))
        }
    }

    /// Number of behaviors on the stack, at least one.
    pub fn behavior_depth(&self) -> usize {
        self.behaviors.depth()
    }

    /// Children currently tracked by this actor.
    pub fn children(&self) -> impl Iterator<Item = &Actor> {
        self.children.values()
    }

    /// Spawn a child with a synthesized numeric name.
    pub fn spawn(&mut self, behavior: Behavior) -> ActorResult<Actor> {
        let name = self.myself.child_names().reserve_next(self.myself.path())?;
        Ok(self.spawn_child(name, behavior))
    }

    /// Spawn a child from inside a behavior.
    ///
    /// The child is recorded before its start signal is released. Fails with
    /// [`ActorError::DuplicateName`] if a live child already uses `name`.
    pub fn spawn_with_name(&mut self, name: &str, behavior: Behavior) -> ActorResult<Actor> {
        let name = self.myself.child_names().reserve(self.myself.path(), name)?;
        Ok(self.spawn_child(name, behavior))
    }

    fn spawn_child(&mut self, name: NameReservation, behavior: Behavior) -> Actor {
        let pending = ActorContext::build(
            self.system(),
            name,
            ActorKind::Child,
            behavior,
            Some(self.myself.control_sender().downgrade()),
            None,
        );
        self.children
            .insert(pending.actor().id(), pending.actor().clone());
        pending.start()
    }

    /// Send a copy of `message` to every recipient of a forwarding actor.
    pub(crate) fn broadcast(&self, message: &Message) {
        if let Some(recipients) = &self.recipients {
            for recipient in recipients.values() {
                recipient.send(message.clone());
            }
        }
    }

    async fn run(mut self, start: oneshot::Receiver<StartSignal>) {
        let cause = match start.await {
            Ok(Ok(())) => {
                self.advance(ActorStatus::Running);
                self.system().registry().started(self.myself.id());
                tracing::debug!("Actor started: {}", self.name());
                self.event_loop().await
            }
            Ok(Err(cause)) => {
                tracing::debug!("Actor {} cancelled before start ({})", self.name(), cause);
                cause
            }
            Err(_) => {
                tracing::debug!("Actor {} discarded before start", self.name());
                StopCause::Killed
            }
        };
        self.finish(cause);
    }

    /// Service events until a stop signal arrives.
    ///
    /// Control events always win over mailbox messages. Nothing is promised
    /// about the order between control events that are ready together.
    async fn event_loop(&mut self) -> StopCause {
        let tick = self.system().config().receive_timeout();
        loop {
            if let Ok(control) = self.control.try_recv() {
                if let Some(cause) = self.handle_control(control) {
                    return cause;
                }
                continue;
            }

            tokio::select! {
                biased;
                Some(control) = self.control.recv() => {
                    if let Some(cause) = self.handle_control(control) {
                        return cause;
                    }
                }
                Some(message) = self.mailbox.recv() => self.dispatch(message),
                _ = tokio::time::sleep(tick) => {
                    tracing::trace!("Receive timeout elapsed for {}", self.name());
                }
            }
        }
    }

    fn handle_control(&mut self, control: ControlMessage) -> Option<StopCause> {
        match control {
            ControlMessage::Kill => return Some(StopCause::Killed),
            ControlMessage::Terminate => return Some(StopCause::Terminated),
            ControlMessage::AttachMonitor(observer) => self.attach_monitor(observer),
            ControlMessage::DetachMonitor(observer) => {
                if let Some(relay) = &self.monitor {
                    relay.remove_id(observer);
                }
            }
            ControlMessage::RegisterChild(pending) => {
                self.children
                    .insert(pending.actor().id(), pending.actor().clone());
                pending.start();
            }
            ControlMessage::ChildStopped(id) => {
                self.children.remove(&id);
            }
            ControlMessage::AddRecipient(recipient) => match &mut self.recipients {
                Some(recipients) => {
                    recipients.insert(recipient.id(), recipient);
                }
                None => self.unsupported("add_recipient"),
            },
            ControlMessage::RemoveRecipient(id) => match &mut self.recipients {
                Some(recipients) => {
                    recipients.remove(&id);
                }
                None => self.unsupported("remove_recipient"),
            },
            ControlMessage::ListRecipients(reply) => {
                let paths = self
                    .recipients
                    .iter()
                    .flat_map(|r| r.values())
                    .map(|a| a.path().clone())
                    .collect();
                let _ = reply.send(paths);
            }
        }
        None
    }

    fn unsupported(&self, kind: &str) {
        tracing::warn!("{} is not a forwarding actor, ignoring {}", self.name(), kind);
    }

    fn attach_monitor(&mut self, observer: Actor) {
        if let Some(relay) = &self.monitor {
            relay.add(&observer);
            return;
        }
        match ForwardingActor::spawn_relay(&self.myself, observer) {
            Ok(relay) => self.monitor = Some(relay),
            Err(e) => tracing::warn!("Failed to spawn monitor relay for {}: {}", self.name(), e),
        }
    }

    /// Run the active behavior, isolating the actor from panics.
    fn dispatch(&mut self, message: Message) {
        let Some(behavior) = self.behaviors.current().cloned() else {
            return;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| behavior.invoke(message, self)));
        if let Err(payload) = outcome {
            let error = panic_message(payload.as_ref());
            tracing::error!("Behavior of {} panicked: {}", self.name(), error);
            self.system()
                .registry()
                .behavior_failed(self.myself.id(), error);
        }
    }

    /// Cascade the stop, notify monitors and report to the registry.
    fn finish(mut self, cause: StopCause) {
        self.advance(ActorStatus::Stopping);

        for child in self.children.values() {
            match cause {
                StopCause::Killed => child.kill(),
                StopCause::Terminated => child.terminate(),
            }
        }

        if let Some(relay) = self.monitor.take() {
            relay.send(Message::down(cause, self.myself.clone()));
        }

        // Nothing queued after this point is handled. Pending children stop
        // unstarted with this actor's cause.
        self.control.close();
        while let Ok(control) = self.control.try_recv() {
            if let ControlMessage::RegisterChild(pending) = control {
                pending.cancel(cause);
            }
        }
        self.mailbox.close();
        let mut discarded = 0usize;
        while self.mailbox.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!("Discarded {} queued messages for {}", discarded, self.name());
        }

        // Free the path before anyone can observe `Stopped`.
        self.reservation.release();
        self.advance(ActorStatus::Stopped);
        self.system().registry().stopped(self.myself.id(), cause);
        if let Some(parent) = self.parent.as_ref().and_then(|p| p.upgrade()) {
            let _ = parent.send(ControlMessage::ChildStopped(self.myself.id()));
        }
        tracing::debug!("Actor stopped: {} ({})", self.name(), cause);
    }

    fn advance(&self, next: ActorStatus) {
        self.status.send_if_modified(|current| {
            if current.can_advance_to(next) {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}

/// Move messages from the unbounded intake into the bounded mailbox.
///
/// Backpressure from a full mailbox stalls this task, never the sender.
async fn pump_mailbox(
    mut intake: mpsc::UnboundedReceiver<Message>,
    mailbox: mpsc::Sender<Message>,
) {
    loop {
        tokio::select! {
            _ = mailbox.closed() => break,
            next = intake.recv() => {
                let Some(message) = next else { break };
                if mailbox.send(message).await.is_err() {
                    break;
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
