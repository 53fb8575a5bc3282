#![allow(dead_code)]

use std::error::Error;
use std::time::Duration;

use actors::{Actor, ActorEvent, Behavior, Message};
use futures_util::future::join_all;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

pub type TestResult = Result<(), Box<dyn Error>>;

/// Upper bound for anything a test waits on.
pub const TIMEOUT: Duration = Duration::from_secs(2);

/// How long a channel must stay empty to count as quiet.
pub const QUIET: Duration = Duration::from_millis(150);

/// A behavior that forwards every message it handles into a channel.
pub fn recorder() -> (Behavior, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let behavior = Behavior::new(move |message, _ctx| {
        let _ = tx.send(message);
    });
    (behavior, rx)
}

/// Receive the next item or fail after `TIMEOUT`.
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Result<T, Box<dyn Error>> {
    timeout(TIMEOUT, rx.recv())
        .await?
        .ok_or_else(|| "channel closed".into())
}

/// Receive the next message and return its first value as a string.
pub async fn next_str(rx: &mut mpsc::UnboundedReceiver<Message>) -> Result<String, Box<dyn Error>> {
    let message = next(rx).await?;
    message
        .str_at(0)
        .map(str::to_string)
        .ok_or_else(|| format!("expected a string, got {:?}", message).into())
}

/// Assert nothing else arrives for a while.
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    if let Ok(Some(item)) = timeout(QUIET, rx.recv()).await {
        panic!("unexpected item: {:?}", item);
    }
}

/// Wait for a single actor to reach `Stopped`.
pub async fn stopped_within(actor: &Actor) -> TestResult {
    timeout(TIMEOUT, actor.wait_stopped()).await?;
    Ok(())
}

/// Wait for every actor to reach `Stopped`.
pub async fn all_stopped(actors: &[Actor]) -> TestResult {
    timeout(TIMEOUT, join_all(actors.iter().map(Actor::wait_stopped))).await?;
    Ok(())
}

/// Drain every event that is already buffered.
pub fn drain_events(events: &mut broadcast::Receiver<ActorEvent>) -> Vec<ActorEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Wait for the first event matching `predicate`.
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<ActorEvent>,
    predicate: F,
) -> Result<ActorEvent, Box<dyn Error>>
where
    F: Fn(&ActorEvent) -> bool,
{
    loop {
        let event = timeout(TIMEOUT, events.recv()).await??;
        if predicate(&event) {
            return Ok(event);
        }
    }
}
