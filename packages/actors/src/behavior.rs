//! Message handling functions and the per-actor behavior stack.

use std::fmt;
use std::sync::Arc;

use crate::{ActorContext, Message};

type BehaviorFn = dyn Fn(Message, &mut ActorContext) + Send + Sync;

/// The function an actor runs for every application message.
///
/// Cloning a behavior is cheap; clones share the same function. State that
/// must survive between messages lives in whatever the closure captures.
#[derive(Clone)]
pub struct Behavior(Arc<BehaviorFn>);

impl Behavior {
    /// Wrap a handler closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Message, &mut ActorContext) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A behavior that ignores every message.
    pub fn ignore() -> Self {
        Self::new(|_, _| {})
    }

    pub(crate) fn invoke(&self, message: Message, ctx: &mut ActorContext) {
        (self.0)(message, ctx)
    }

    /// Whether both handles point at the same function.
    pub fn ptr_eq(&self, other: &Behavior) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Behavior")
    }
}

/// Stack of behaviors; the top is the active one.
///
/// The stack is never empty: the behavior an actor was spawned with can be
/// replaced but never popped.
#[derive(Debug, Clone)]
pub(crate) struct BehaviorStack {
    stack: Vec<Behavior>,
}

impl BehaviorStack {
    pub(crate) fn new(initial: Behavior) -> Self {
        Self {
            stack: vec![initial],
        }
    }

    /// Push `behavior`, or replace the top when `discard_old` is set.
    pub(crate) fn become_behavior(&mut self, behavior: Behavior, discard_old: bool) {
        if discard_old {
            self.stack.pop();
        }
        self.stack.push(behavior);
    }

    /// Pop the top behavior. Returns `false` and leaves the stack untouched
    /// when only one behavior is left.
    pub(crate) fn unbecome(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub(crate) fn current(&self) -> Option<&Behavior> {
        self.stack.last()
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }
}
