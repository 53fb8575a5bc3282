//! Control-plane messages serviced ahead of an actor's mailbox.

use actor_core::{ActorId, ActorPath};
use tokio::sync::oneshot;

use crate::Actor;
use crate::context::PendingStart;

/// Signals handled by an actor's engine before any queued application message.
pub(crate) enum ControlMessage {
    /// Stop immediately.
    Kill,

    /// Stop cooperatively, after the message currently being handled.
    Terminate,

    /// Start delivering this actor's `Down` to the observer.
    AttachMonitor(Actor),

    /// Stop delivering this actor's `Down` to the observer.
    DetachMonitor(ActorId),

    /// Adopt a freshly built child and release its start signal.
    RegisterChild(PendingStart),

    /// A child reached its terminal state.
    ChildStopped(ActorId),

    /// Forwarders only: add a recipient.
    AddRecipient(Actor),

    /// Forwarders only: remove a recipient.
    RemoveRecipient(ActorId),

    /// Forwarders only: report the current recipient set.
    ListRecipients(oneshot::Sender<Vec<ActorPath>>),
}

impl ControlMessage {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Kill => "kill",
            ControlMessage::Terminate => "terminate",
            ControlMessage::AttachMonitor(_) => "attach_monitor",
            ControlMessage::DetachMonitor(_) => "detach_monitor",
            ControlMessage::RegisterChild(_) => "register_child",
            ControlMessage::ChildStopped(_) => "child_stopped",
            ControlMessage::AddRecipient(_) => "add_recipient",
            ControlMessage::RemoveRecipient(_) => "remove_recipient",
            ControlMessage::ListRecipients(_) => "list_recipients",
        }
    }
}
