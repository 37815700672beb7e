//! Shutdown coordination.
//!
//! # States
//! ```text
//! Running ──signal──▶ Draining ──report empty──▶ Terminated (Clean, exit 0)
//!                         │
//!                         └────deadline─────────▶ Terminated (Forced, exit 1)
//! ```
//!
//! Entering `Draining` raises the maintenance flag, stops the realtime
//! subsystem, sends every registered session a maintenance notice and then
//! queues its disconnection. The consistency poll and the deadline race;
//! the loser is dropped. Signals that arrive while draining are ignored.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::config::ShutdownConfig;
use crate::gateway::{DisconnectReason, Gateway, MAINTENANCE_EVENT};
use crate::lifecycle::signals::TerminationSignal;
use crate::lifecycle::Lifecycle;
use crate::persistence::{ConsistencyOutcome, ReadinessGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Running,
    Draining,
    Terminated,
}

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every pending revision was persisted.
    Clean,
    /// The deadline elapsed with revisions still pending.
    Forced,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Forced => 1,
        }
    }
}

pub struct ShutdownCoordinator {
    lifecycle: Arc<Lifecycle>,
    gateway: Arc<Gateway>,
    gate: ReadinessGate,
    config: ShutdownConfig,
    state: watch::Sender<CoordinatorState>,
}

impl ShutdownCoordinator {
    pub fn new(
        lifecycle: Arc<Lifecycle>,
        gateway: Arc<Gateway>,
        gate: ReadinessGate,
        config: ShutdownConfig,
    ) -> Self {
        let (state, _) = watch::channel(CoordinatorState::Running);
        Self {
            lifecycle,
            gateway,
            gate,
            config,
            state,
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Wait for a termination signal, drain, and report how to exit.
    pub async fn run(self, mut signals: mpsc::Receiver<TerminationSignal>) -> ExitStatus {
        match signals.recv().await {
            Some(signal) => {
                tracing::info!(signal = %signal, "Program has been killed by signal, try to exit gracefully...");
            }
            None => tracing::warn!("Signal source closed, shutting down"),
        }

        let drained = self.begin_drain();
        tracing::info!(
            sessions = drained,
            poll_interval_ms = self.config.poll_interval_ms,
            deadline_ms = self.config.deadline_ms,
            "Draining"
        );

        let outcome = {
            let wait = self
                .gate
                .await_consistency_within(self.config.poll_interval(), self.config.deadline());
            tokio::pin!(wait);

            loop {
                tokio::select! {
                    outcome = &mut wait => break outcome,
                    Some(signal) = signals.recv() => {
                        tracing::info!(signal = %signal, "Already draining, ignoring signal");
                    }
                }
            }
        };

        self.state.send_replace(CoordinatorState::Terminated);
        match outcome {
            ConsistencyOutcome::Consistent => {
                tracing::info!("All revisions persisted, exiting cleanly");
                ExitStatus::Clean
            }
            ConsistencyOutcome::TimedOut => {
                tracing::error!(
                    deadline_ms = self.config.deadline_ms,
                    "Revisions still pending at deadline, forcing exit"
                );
                ExitStatus::Forced
            }
        }
    }

    /// `Running → Draining`. Returns the number of sessions notified.
    fn begin_drain(&self) -> usize {
        if !self.lifecycle.enter_maintenance() {
            return 0;
        }
        self.state.send_replace(CoordinatorState::Draining);
        self.gateway.realtime().terminate();

        let sessions = self.gateway.snapshot();
        for session in &sessions {
            session.emit(MAINTENANCE_EVENT, Value::Null);
            self.gateway
                .disconnect(session.id(), DisconnectReason::Maintenance);
        }
        sessions.len()
    }
}
