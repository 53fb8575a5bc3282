#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;

use actors::{Actor, ActorSystem, Behavior, Message, StopCause, msg};
use common::{TIMEOUT, TestResult, assert_quiet, next, recorder, stopped_within};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Wait for the next `Down` and return the path and cause it reports.
async fn next_down(
    rx: &mut mpsc::UnboundedReceiver<Message>,
) -> Result<(String, StopCause), Box<dyn Error>> {
    let message = next(rx).await?;
    let down = message
        .as_down()
        .ok_or_else(|| format!("expected a Down message, got {:?}", message))?;
    Ok((down.actor.name().to_string(), down.cause))
}

#[tokio::test]
async fn test_monitor_receives_single_down_on_kill() -> TestResult {
    let system = ActorSystem::new("watch")?;
    let (behavior, mut downs) = recorder();
    let observer = system.spawn_with_name("observer", behavior)?;
    let subject = system.spawn_with_name("subject", Behavior::ignore())?;

    observer.monitor(&subject);
    subject.kill();

    let message = next(&mut downs).await?;
    assert!(message.is_control());
    let down = message.as_down().ok_or("expected a Down message")?;
    assert_eq!(down.cause, StopCause::Killed);
    assert_eq!(down.actor, subject);
    assert_quiet(&mut downs).await;

    // The relay stops by itself once the Down is delivered.
    observer.terminate();
    timeout(TIMEOUT, system.wait_for_all_actors_stopped()).await?;
    assert!(system.snapshot().await.relays.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_parent_and_child_both_report_down() -> TestResult {
    let system = ActorSystem::new("family")?;
    let (behavior, mut downs) = recorder();
    let observer = system.spawn_with_name("observer", behavior)?;
    let parent = system.spawn_with_name("parent", Behavior::ignore())?;
    let child = parent.spawn_with_name("child", Behavior::ignore())?;

    observer.monitor(&parent);
    observer.monitor(&child);
    parent.terminate();

    let mut reports = vec![next_down(&mut downs).await?, next_down(&mut downs).await?];
    reports.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        reports,
        vec![
            ("/family/parent".to_string(), StopCause::Terminated),
            ("/family/parent/child".to_string(), StopCause::Terminated),
        ]
    );
    assert_quiet(&mut downs).await;

    system.graceful_shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_monitoring_twice_yields_one_down() -> TestResult {
    let system = ActorSystem::new("twice")?;
    let (behavior, mut downs) = recorder();
    let observer = system.spawn_with_name("observer", behavior)?;
    let subject = system.spawn_with_name("subject", Behavior::ignore())?;

    observer.monitor(&subject);
    observer.monitor(&subject);
    subject.terminate();

    let (name, cause) = next_down(&mut downs).await?;
    assert_eq!(name, "/twice/subject");
    assert_eq!(cause, StopCause::Terminated);
    assert_quiet(&mut downs).await;

    system.graceful_shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_every_monitor_gets_its_own_down() -> TestResult {
    let system = ActorSystem::new("crowd")?;
    let subject = system.spawn_with_name("subject", Behavior::ignore())?;

    let mut receivers = Vec::new();
    for i in 0..3 {
        let (behavior, rx) = recorder();
        let observer = system.spawn_with_name(&format!("observer-{}", i), behavior)?;
        observer.monitor(&subject);
        receivers.push(rx);
    }
    subject.kill();

    for rx in &mut receivers {
        let (name, cause) = next_down(rx).await?;
        assert_eq!(name, "/crowd/subject");
        assert_eq!(cause, StopCause::Killed);
        assert_quiet(rx).await;
    }

    system.shutdown_now().await;
    Ok(())
}

#[tokio::test]
async fn test_demonitor_stops_delivery() -> TestResult {
    let system = ActorSystem::new("unwatch")?;
    let subject = system.spawn_with_name("subject", Behavior::ignore())?;
    let (kept_behavior, mut kept) = recorder();
    let (dropped_behavior, mut dropped) = recorder();
    let keeper = system.spawn_with_name("keeper", kept_behavior)?;
    let quitter = system.spawn_with_name("quitter", dropped_behavior)?;

    keeper.monitor(&subject);
    quitter.monitor(&subject);
    quitter.demonitor(&subject);
    subject.terminate();

    let (name, _) = next_down(&mut kept).await?;
    assert_eq!(name, "/unwatch/subject");
    assert_quiet(&mut dropped).await;

    system.graceful_shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_monitoring_a_stopped_actor_is_a_no_op() -> TestResult {
    let system = ActorSystem::new("late")?;
    let (behavior, mut downs) = recorder();
    let observer = system.spawn_with_name("observer", behavior)?;
    let subject = system.spawn_with_name("subject", Behavior::ignore())?;

    subject.kill();
    stopped_within(&subject).await?;
    observer.monitor(&subject);

    assert_quiet(&mut downs).await;
    assert!(system.snapshot().await.relays.is_empty());

    system.graceful_shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_monitor_from_inside_a_behavior() -> TestResult {
    let system = ActorSystem::new("inside")?;
    let subject = system.spawn_with_name("subject", Behavior::ignore())?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let watcher = system.spawn_with_name(
        "watcher",
        Behavior::new(move |message, ctx| {
            if let Some(down) = message.as_down() {
                let _ = tx.send(down.actor.clone());
            } else if let Some(target) = message.actor_at(0) {
                ctx.myself().monitor(target);
            }
        }),
    )?;

    watcher.send(msg![subject.clone()]);
    // Give the watcher time to attach before the subject stops.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    subject.terminate();

    let reported: Actor = next(&mut rx).await?;
    assert_eq!(reported, subject);

    system.graceful_shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_relays_for_similar_paths_stay_distinct() -> TestResult {
    let system = ActorSystem::new("rel")?;
    let (behavior, mut downs) = recorder();
    let observer = system.spawn_with_name("observer", behavior)?;
    let a = system.spawn_with_name("a", Behavior::ignore())?;
    let nested = a.spawn_with_name("b", Behavior::ignore())?;
    let flat = system.spawn_with_name("a-b", Behavior::ignore())?;

    observer.monitor(&nested);
    observer.monitor(&flat);
    let paths = timeout(TIMEOUT, async {
        loop {
            let relays = system.snapshot().await.relays;
            if relays.len() == 2 {
                return relays;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await?;
    let mut relays: Vec<&str> = paths.iter().map(|path| path.as_str()).collect();
    relays.sort();
    assert_eq!(relays, ["/rel/a-b-monitor", "/rel/a-b-monitor-1"]);

    nested.kill();
    flat.terminate();
    let mut reports = vec![next_down(&mut downs).await?, next_down(&mut downs).await?];
    reports.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        reports,
        [
            ("/rel/a-b".to_string(), StopCause::Terminated),
            ("/rel/a/b".to_string(), StopCause::Killed),
        ]
    );
    assert_quiet(&mut downs).await;

    system.graceful_shutdown().await;
    Ok(())
}
