//! Cloneable handle to a running actor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use actor_core::{ActorId, ActorPath, ActorStatus};
use tokio::sync::{mpsc, watch};

use crate::context::ActorContext;
use crate::control::ControlMessage;
use crate::error::{ActorError, ActorResult};
use crate::names::{NameReservation, NameTable};
use crate::registry::ActorKind;
use crate::{ActorSystem, Behavior, Message};

/// Shared state behind every clone of an [`Actor`] handle.
pub(crate) struct ActorCell {
    pub(crate) id: ActorId,
    pub(crate) path: ActorPath,
    pub(crate) system: ActorSystem,
    /// Unbounded intake drained into the bounded mailbox by the dispatch task.
    pub(crate) intake: mpsc::UnboundedSender<Message>,
    pub(crate) control: mpsc::UnboundedSender<ControlMessage>,
    pub(crate) status: watch::Receiver<ActorStatus>,
    /// Local names of this actor's live children.
    pub(crate) children: Arc<NameTable>,
}

/// Handle to an actor.
///
/// Every operation is fire-and-forget: it enqueues a request and returns
/// immediately, and the actor's own task applies it. Operations on a stopped
/// actor are silently dropped.
#[derive(Clone)]
pub struct Actor {
    cell: Arc<ActorCell>,
}

impl Actor {
    pub(crate) fn from_cell(cell: ActorCell) -> Self {
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Enqueue an application message.
    ///
    /// Messages from one sender are handled in the order they were sent. A
    /// full mailbox only delays delivery; the caller never waits.
    pub fn send(&self, message: Message) {
        if self.cell.intake.send(message).is_err() {
            tracing::trace!("Dropping message for stopped actor {}", self.name());
        }
    }

    /// Ask the actor to stop after the message it is currently handling.
    pub fn terminate(&self) {
        self.control(ControlMessage::Terminate);
    }

    /// Stop the actor immediately.
    pub fn kill(&self) {
        self.control(ControlMessage::Kill);
    }

    /// Receive a `Down` message when `other` stops.
    ///
    /// Monitoring an actor that already stopped does nothing; no `Down` is
    /// delivered after the fact. Monitoring the same actor twice still yields a
    /// single `Down`.
    pub fn monitor(&self, other: &Actor) {
        other.control(ControlMessage::AttachMonitor(self.clone()));
    }

    /// Stop receiving `Down` for `other`.
    pub fn demonitor(&self, other: &Actor) {
        other.control(ControlMessage::DetachMonitor(self.id()));
    }

    /// Spawn a child with a synthesized numeric name.
    pub fn spawn(&self, behavior: Behavior) -> ActorResult<Actor> {
        let name = self.cell.children.reserve_next(self.path())?;
        self.spawn_child(name, behavior)
    }

    /// Spawn a child named `name` under this actor.
    ///
    /// The child is handed to this actor's control plane and only starts once
    /// this actor has recorded it, so it never processes a message before its
    /// parent tracks it. Messages sent to the returned handle meanwhile are
    /// queued. Fails with [`ActorError::DuplicateName`] if a live child
    /// already uses `name`.
    pub fn spawn_with_name(&self, name: &str, behavior: Behavior) -> ActorResult<Actor> {
        let name = self.cell.children.reserve(self.path(), name)?;
        self.spawn_child(name, behavior)
    }

    fn spawn_child(&self, name: NameReservation, behavior: Behavior) -> ActorResult<Actor> {
        let pending = ActorContext::build(
            self.system(),
            name,
            ActorKind::Child,
            behavior,
            Some(self.cell.control.downgrade()),
            None,
        );
        let child = pending.actor().clone();
        if self
            .cell
            .control
            .send(ControlMessage::RegisterChild(pending))
            .is_err()
        {
            // The pending start was dropped with the message, so the child
            // stops without ever running.
            return Err(ActorError::ActorStopped(self.name().to_string()));
        }
        Ok(child)
    }

    /// Canonical path of this actor, e.g. `/system/parent/child`.
    pub fn name(&self) -> &str {
        self.cell.path.as_str()
    }

    /// Canonical path of this actor as an [`ActorPath`].
    pub fn path(&self) -> &ActorPath {
        &self.cell.path
    }

    /// Unique id assigned at spawn.
    pub fn id(&self) -> ActorId {
        self.cell.id
    }

    /// The system this actor belongs to.
    pub fn system(&self) -> &ActorSystem {
        &self.cell.system
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ActorStatus {
        *self.cell.status.borrow()
    }

    /// Whether the actor reached `Stopped`.
    pub fn is_stopped(&self) -> bool {
        self.status().is_stopped()
    }

    /// Wait until the actor reaches `Stopped`.
    pub async fn wait_stopped(&self) {
        let mut status = self.cell.status.clone();
        if status.wait_for(|s| s.is_stopped()).await.is_err() {
            tracing::trace!("Status channel of {} closed", self.name());
        }
    }

    pub(crate) fn control(&self, message: ControlMessage) {
        if let Err(err) = self.cell.control.send(message) {
            tracing::trace!(
                "Dropping {} signal for stopped actor {}",
                err.0.kind(),
                self.name()
            );
        }
    }

    pub(crate) fn child_names(&self) -> &Arc<NameTable> {
        &self.cell.children
    }

    pub(crate) fn control_sender(&self) -> &mpsc::UnboundedSender<ControlMessage> {
        &self.cell.control
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.cell.id == other.cell.id
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.id.hash(state);
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("path", &self.cell.path)
            .field("id", &self.cell.id)
            .finish()
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
