// src/shutdown.rs
//
// Cooperative shutdown primitives
//
// - ShutdownSignal: process-wide, set at most once, never cleared
// - StopAck: per-actor flag set once after the actor drained and cleaned
// - Rendezvous: startup barrier that a timed-out supervisor can still release

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

use crate::constants::MAX_SLEEP_INCREMENT;

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns true only for the call that flipped it.
    pub fn trigger(&self) -> bool {
        let first = !self.flag.swap(true, Ordering::SeqCst);
        if first {
            debug!("shutdown signal set");
        }
        self.notify.notify_waiters();
        first
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `total` in increments of at most one second, returning
    /// early once shutdown is requested. True if the full duration elapsed.
    pub async fn sleep(&self, total: Duration) -> bool {
        let mut remaining = total;
        while !remaining.is_zero() {
            if self.is_set() {
                return false;
            }
            let step = remaining.min(MAX_SLEEP_INCREMENT);
            tokio::select! {
                _ = tokio::time::sleep(step) => {}
                _ = self.wait() => return false,
            }
            remaining -= step;
        }
        !self.is_set()
    }
}

/// Set-once acknowledgement that an actor has fully stopped
#[derive(Debug, Clone, Default)]
pub struct StopAck(Arc<AtomicBool>);

impl StopAck {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only on the first call
    pub fn acknowledge(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_acknowledged(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Startup barrier: actors arrive and wait for release; the supervisor waits
/// (bounded) for every arrival and then releases everyone.
#[derive(Debug)]
pub struct Rendezvous {
    parties: usize,
    arrived: watch::Sender<usize>,
    released: watch::Sender<bool>,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            arrived: watch::Sender::new(0),
            released: watch::Sender::new(false),
        }
    }

    pub fn arrived(&self) -> usize {
        *self.arrived.borrow()
    }

    /// Called once per actor after setup. Returns when released or when
    /// shutdown is requested.
    pub async fn arrive(&self, shutdown: &ShutdownSignal) {
        self.arrived.send_modify(|n| *n += 1);
        let mut rx = self.released.subscribe();
        tokio::select! {
            _ = rx.wait_for(|r| *r) => {}
            _ = shutdown.wait() => {}
        }
    }

    /// Wait until every party arrived or `timeout` passes, then release.
    /// True if everyone arrived in time.
    pub async fn wait_all(&self, timeout: Duration) -> bool {
        let mut rx = self.arrived.subscribe();
        let parties = self.parties;
        let all = tokio::time::timeout(timeout, async move {
            rx.wait_for(|n| *n >= parties).await.is_ok()
        })
        .await
        .unwrap_or(false);
        if !all {
            warn!(
                arrived = self.arrived(),
                expected = self.parties,
                "startup rendezvous timed out, releasing anyway"
            );
        }
        self.release();
        all
    }

    pub fn release(&self) {
        self.released.send_replace(true);
    }
}
