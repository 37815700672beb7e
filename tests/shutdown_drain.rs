//! Shutdown coordinator behaviour under a paused clock.

use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;

use collab_gateway::config::ShutdownConfig;
use collab_gateway::gateway::{
    DisconnectReason, Event, Outbound, Registration, SessionHandle, MAINTENANCE_EVENT,
};
use collab_gateway::lifecycle::{
    CoordinatorState, ExitStatus, Readiness, ShutdownCoordinator, TerminationSignal,
};
use collab_gateway::net::ConnectionId;
use collab_gateway::realtime::Identity;

mod common;

use common::Harness;

fn coordinator(harness: &Harness) -> ShutdownCoordinator {
    ShutdownCoordinator::new(
        harness.lifecycle.clone(),
        harness.gateway.clone(),
        harness.gate(),
        ShutdownConfig::default(),
    )
}

struct Sessions {
    _guards: Vec<Registration>,
    receivers: Vec<UnboundedReceiver<Outbound>>,
}

fn connect(harness: &Harness, count: usize) -> Sessions {
    let mut sessions = Sessions {
        _guards: Vec::new(),
        receivers: Vec::new(),
    };
    for i in 0..count {
        let (handle, rx) =
            SessionHandle::new(ConnectionId::new(), Identity::User(format!("user-{i}")));
        sessions._guards.push(harness.gateway.registry().register(handle));
        sessions.receivers.push(rx);
    }
    sessions
}

fn assert_notified_then_closed(rx: &mut UnboundedReceiver<Outbound>) {
    assert_eq!(
        rx.try_recv().unwrap(),
        Outbound::Event(Event::new(MAINTENANCE_EVENT, Value::Null))
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        Outbound::Close(DisconnectReason::Maintenance)
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn drains_cleanly_once_documents_flush() {
    let harness = Harness::new();
    let mut sessions = connect(&harness, 3);
    harness.persistence.mark_dirty("doc-a");
    harness.persistence.mark_dirty("doc-b");

    let persistence = harness.persistence.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        persistence.flush_all();
    });

    let (tx, rx) = mpsc::channel(4);
    tx.send(TerminationSignal::Terminate).await.unwrap();

    let start = Instant::now();
    let status = coordinator(&harness).run(rx).await;
    let elapsed = start.elapsed();

    assert_eq!(status, ExitStatus::Clean);
    assert_eq!(status.code(), 0);
    assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(350), "{elapsed:?}");

    for rx in &mut sessions.receivers {
        assert_notified_then_closed(rx);
    }
    assert!(harness.gateway.registry().is_empty());
    assert!(harness.lifecycle.in_maintenance());
    assert_eq!(harness.lifecycle.readiness(), Readiness::Draining);
    assert_eq!(harness.realtime.terminate_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn forces_exit_at_deadline() {
    let harness = Harness::new();
    let _sessions = connect(&harness, 1);
    harness.persistence.mark_dirty("doc-a");

    let (tx, rx) = mpsc::channel(4);
    tx.send(TerminationSignal::Interrupt).await.unwrap();

    let start = Instant::now();
    let status = coordinator(&harness).run(rx).await;
    let elapsed = start.elapsed();

    assert_eq!(status, ExitStatus::Forced);
    assert_eq!(status.code(), 1);
    assert!(elapsed >= Duration::from_millis(5000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(5100), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn repeated_signals_do_not_restart_the_drain() {
    let harness = Harness::new();
    let mut sessions = connect(&harness, 2);
    harness.persistence.mark_dirty("doc-a");

    let (tx, rx) = mpsc::channel(4);
    tx.send(TerminationSignal::Terminate).await.unwrap();
    let late = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3000)).await;
        let _ = late.send(TerminationSignal::Interrupt).await;
        let _ = late.send(TerminationSignal::Quit).await;
    });

    let start = Instant::now();
    let status = coordinator(&harness).run(rx).await;
    let elapsed = start.elapsed();

    assert_eq!(status, ExitStatus::Forced);
    assert!(elapsed >= Duration::from_millis(5000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(5100), "{elapsed:?}");
    assert_eq!(harness.realtime.terminate_calls(), 1);
    for rx in &mut sessions.receivers {
        assert_notified_then_closed(rx);
    }
    assert!(harness.lifecycle.in_maintenance());
}

#[tokio::test(start_paused = true)]
async fn realtime_never_ready_forces_exit() {
    let harness = Harness::new();
    harness.realtime.set_available(false);

    let (tx, rx) = mpsc::channel(4);
    tx.send(TerminationSignal::Terminate).await.unwrap();

    let status = coordinator(&harness).run(rx).await;

    assert_eq!(status, ExitStatus::Forced);
    assert_eq!(harness.persistence.report_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn report_errors_are_retried_until_clean() {
    let harness = Harness::new();
    harness.persistence.fail_next_reports(3);

    let (tx, rx) = mpsc::channel(4);
    tx.send(TerminationSignal::Terminate).await.unwrap();

    let start = Instant::now();
    let status = coordinator(&harness).run(rx).await;

    assert_eq!(status, ExitStatus::Clean);
    assert_eq!(harness.persistence.report_calls(), 4);
    assert!(start.elapsed() >= Duration::from_millis(400));
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn first_check_waits_one_poll_interval() {
    let harness = Harness::new();

    let (tx, rx) = mpsc::channel(4);
    tx.send(TerminationSignal::Terminate).await.unwrap();

    let start = Instant::now();
    let status = coordinator(&harness).run(rx).await;

    assert_eq!(status, ExitStatus::Clean);
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(harness.persistence.report_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn closed_signal_source_starts_the_drain() {
    let harness = Harness::new();
    let (tx, rx) = mpsc::channel::<TerminationSignal>(1);
    drop(tx);

    let status = coordinator(&harness).run(rx).await;

    assert_eq!(status, ExitStatus::Clean);
    assert!(harness.lifecycle.in_maintenance());
}

#[tokio::test(start_paused = true)]
async fn publishes_state_transitions() {
    let harness = Harness::new();
    harness.persistence.mark_dirty("doc-a");
    let coordinator = coordinator(&harness);
    let mut state = coordinator.subscribe();
    assert_eq!(*state.borrow(), CoordinatorState::Running);

    let (tx, rx) = mpsc::channel(4);
    let run = tokio::spawn(coordinator.run(rx));

    tx.send(TerminationSignal::Terminate).await.unwrap();
    state
        .wait_for(|s| *s == CoordinatorState::Draining)
        .await
        .unwrap();
    assert!(!run.is_finished());

    harness.persistence.flush_all();
    assert_eq!(run.await.unwrap(), ExitStatus::Clean);
    assert_eq!(*state.borrow(), CoordinatorState::Terminated);
}
