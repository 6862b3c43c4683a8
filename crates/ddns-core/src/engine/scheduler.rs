//! Periodic driver for the engine
//!
//! Runs one cycle immediately, then one per period, until shutdown. Cycles
//! are serialized through a mutex around the engine: a slow cycle delays the
//! next tick but never overlaps it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{CycleOutcome, DdnsEngine};
use crate::error::{Error, Result};

/// Drives a [`DdnsEngine`] on a fixed period
#[derive(Clone)]
pub struct Scheduler {
    /// Engine shared between cycles; the lock is held for a whole cycle
    engine: Arc<Mutex<DdnsEngine>>,

    /// Time between cycle starts
    period: Duration,

    /// Optional sink for cycle outcomes
    outcome_tx: Option<mpsc::Sender<CycleOutcome>>,
}

impl Scheduler {
    /// Create a scheduler for `engine` ticking every `period`
    pub fn new(engine: DdnsEngine, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::config("Scheduler period must be > 0"));
        }

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            period,
            outcome_tx: None,
        })
    }

    /// Also publish every outcome on a bounded channel
    ///
    /// When the channel is full, outcomes are dropped with a warning rather
    /// than stalling the cycle.
    pub fn with_outcome_channel(mut self, capacity: usize) -> (Self, mpsc::Receiver<CycleOutcome>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.outcome_tx = Some(tx);
        (self, rx)
    }

    /// Shared handle to the engine (e.g. to inspect its state)
    pub fn engine(&self) -> Arc<Mutex<DdnsEngine>> {
        Arc::clone(&self.engine)
    }

    /// Run exactly one cycle, waiting for any cycle already in flight
    pub async fn run_cycle(&self) -> CycleOutcome {
        let mut engine = self.engine.lock().await;
        let outcome = engine.reconcile().await;
        let record = format!("{}.{}", engine.record_name(), engine.domain());
        let status = outcome.status_line(engine.is_dry_run());
        drop(engine);

        if outcome.is_failure() {
            warn!(record = %record, "{}", status);
        } else {
            info!(record = %record, "{}", status);
        }

        self.emit_outcome(outcome.clone());
        outcome
    }

    /// Run cycles until `shutdown_rx` fires (or its sender is dropped).
    ///
    /// The first cycle starts immediately. A cycle in progress when shutdown
    /// arrives is allowed to finish.
    pub async fn run_with_shutdown(&self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Reconciling every {:?}", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }

                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received, scheduler stopped");
                    break;
                }
            }
        }
    }

    fn emit_outcome(&self, outcome: CycleOutcome) {
        if let Some(tx) = &self.outcome_tx {
            if tx.try_send(outcome).is_err() {
                warn!("Outcome channel full or closed, dropping cycle outcome");
            }
        }
    }
}
