//! Actors that rebroadcast messages to a set of recipients.

use std::collections::BTreeMap;
use std::ops::Deref;

use actor_core::{ActorId, ActorPath};
use tokio::sync::oneshot;

use crate::context::ActorContext;
use crate::control::ControlMessage;
use crate::error::ActorResult;
use crate::names::NameReservation;
use crate::registry::ActorKind;
use crate::{Actor, ActorSystem, Behavior};

/// An actor that sends a copy of every message it receives to each of its
/// recipients.
///
/// The recipient set lives inside the forwarder's own context. `add` and
/// `remove` travel on its control plane, so a broadcast always sees the set
/// either entirely before or entirely after a change.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ForwardingActor {
    actor: Actor,
}

impl ForwardingActor {
    pub(crate) fn spawn(
        system: &ActorSystem,
        name: NameReservation,
        kind: ActorKind,
        recipients: impl IntoIterator<Item = Actor>,
        behavior: Behavior,
    ) -> Self {
        let recipients: BTreeMap<ActorId, Actor> =
            recipients.into_iter().map(|a| (a.id(), a)).collect();
        let pending =
            ActorContext::build(system, name, kind, behavior, None, Some(recipients));
        Self {
            actor: pending.start(),
        }
    }

    /// Spawn the relay that delivers `subject`'s `Down` to its monitors.
    ///
    /// The relay is a top-level actor of the subject's system and stops by
    /// itself once it has forwarded the subject's `Down`. Its name is derived
    /// from the subject's path and gets a numeric suffix when that name is
    /// already in use.
    pub(crate) fn spawn_relay(subject: &Actor, observer: Actor) -> ActorResult<Self> {
        let system = subject.system();
        let name = system
            .names()
            .reserve_unique(system.root_path(), &subject.path().relay_name())?;
        Ok(Self::spawn(
            system,
            name,
            ActorKind::Relay,
            [observer],
            relay_behavior(subject.id()),
        ))
    }

    /// Start forwarding to `recipient`. Adding a recipient twice has no effect.
    pub fn add(&self, recipient: &Actor) {
        self.actor
            .control(ControlMessage::AddRecipient(recipient.clone()));
    }

    /// Stop forwarding to `recipient`.
    pub fn remove(&self, recipient: &Actor) {
        self.remove_id(recipient.id());
    }

    pub(crate) fn remove_id(&self, id: ActorId) {
        self.actor.control(ControlMessage::RemoveRecipient(id));
    }

    /// Paths of the current recipients. Empty once the forwarder stopped.
    pub async fn recipients(&self) -> Vec<ActorPath> {
        let (tx, rx) = oneshot::channel();
        self.actor.control(ControlMessage::ListRecipients(tx));
        rx.await.unwrap_or_default()
    }

    /// The underlying actor handle.
    pub fn as_actor(&self) -> &Actor {
        &self.actor
    }
}

impl Deref for ForwardingActor {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.actor
    }
}

impl From<ForwardingActor> for Actor {
    fn from(forwarder: ForwardingActor) -> Self {
        forwarder.actor
    }
}

pub(crate) fn broadcast_behavior() -> Behavior {
    Behavior::new(|message, ctx| ctx.broadcast(&message))
}

fn relay_behavior(subject: ActorId) -> Behavior {
    Behavior::new(move |message, ctx| {
        ctx.broadcast(&message);
        if message.as_down().is_some_and(|down| down.actor.id() == subject) {
            ctx.myself().terminate();
        }
    })
}
