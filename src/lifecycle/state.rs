//! Process-wide lifecycle state.
//!
//! One `Lifecycle` is created at boot and shared by `Arc` with every
//! component that needs to observe it. Writers are restricted by convention:
//! startup promotes readiness to `Ready`, the shutdown coordinator raises the
//! maintenance flag and moves readiness to `Draining`. Neither value ever
//! moves backwards.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Whether the realtime subsystem may safely interact with persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    NotReady = 0,
    Ready = 1,
    Draining = 2,
}

impl Readiness {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Readiness::NotReady,
            1 => Readiness::Ready,
            _ => Readiness::Draining,
        }
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    maintenance: AtomicBool,
    readiness: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            maintenance: AtomicBool::new(false),
            readiness: AtomicU8::new(Readiness::NotReady as u8),
        }
    }

    /// True once shutdown has begun. Never reverts.
    pub fn in_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::SeqCst)
    }

    /// Raise the maintenance flag.
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// callers can use it as a once-guard.
    pub fn enter_maintenance(&self) -> bool {
        let first = !self.maintenance.swap(true, Ordering::SeqCst);
        self.advance(Readiness::Draining);
        if first {
            metrics::gauge!("gateway_maintenance").set(1.0);
        }
        first
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::from_u8(self.readiness.load(Ordering::SeqCst))
    }

    /// Mark the gateway as serving traffic. No-op once draining.
    pub fn mark_ready(&self) {
        self.advance(Readiness::Ready);
    }

    fn advance(&self, to: Readiness) {
        self.readiness.fetch_max(to as u8, Ordering::SeqCst);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
