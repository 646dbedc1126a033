// src/monitor/scheduler.rs
//! Cycle scheduler: a two-state machine (stopped / running) around a repeating timer.
//!
//! - `start()` spawns the timer task; its first tick fires immediately, so a cycle
//!   runs right away. Starting a running scheduler is a no-op.
//! - `stop()` flips the cancel token. A cycle in flight finishes its current unit
//!   and returns; the timer task exits without waiting for the next tick.
//! - Cycles never overlap: each takes the scheduler's cycle lock, so a restart
//!   waits for the tail of the stopped cycle. Ticks missed during a long cycle are
//!   skipped and a warning is logged.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::cancel::CancelToken;
use super::types::Severity;
use super::{CycleSummary, Monitor};
use crate::config::DEFAULT_INTERVAL_MINUTES;

/// Snapshot of the scheduler's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    pub is_running: bool,
    pub interval_minutes: u32,
    pub last_run: Option<DateTime<Utc>>,
}

struct Running {
    cancel: CancelToken,
    _task: JoinHandle<()>,
}

struct State {
    interval_minutes: u32,
    last_run: Option<DateTime<Utc>>,
    running: Option<Running>,
}

struct Inner {
    monitor: Monitor,
    state: Mutex<State>,
    cycle_lock: tokio::sync::Mutex<()>,
}

pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(monitor: Monitor) -> Self {
        Self::with_interval(monitor, DEFAULT_INTERVAL_MINUTES)
    }

    pub fn with_interval(monitor: Monitor, interval_minutes: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                monitor,
                state: Mutex::new(State {
                    interval_minutes: interval_minutes.max(1),
                    last_run: None,
                    running: None,
                }),
                cycle_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn state(&self) -> CycleState {
        let s = self.inner.lock_state();
        CycleState {
            is_running: s.running.is_some(),
            interval_minutes: s.interval_minutes,
            last_run: s.last_run,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running
    }

    /// Change the cycle interval. Only allowed while stopped.
    pub fn set_interval_minutes(&self, minutes: u32) -> Result<()> {
        if minutes == 0 {
            bail!("interval must be at least one minute");
        }
        let mut s = self.inner.lock_state();
        if s.running.is_some() {
            bail!("cannot change the interval while the scheduler is running");
        }
        s.interval_minutes = minutes;
        Ok(())
    }

    /// Stopped → Running. Returns `false` if it was already running.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut s = self.inner.lock_state();
        if s.running.is_some() {
            tracing::debug!(target: "monitor", "start ignored; scheduler already running");
            return false;
        }

        let period = Duration::from_secs(u64::from(s.interval_minutes) * 60);
        let cancel = CancelToken::new();
        let task = tokio::spawn(timer_loop(self.inner.clone(), period, cancel.clone()));
        s.running = Some(Running {
            cancel,
            _task: task,
        });
        drop(s);

        tracing::info!(target: "monitor", interval_secs = period.as_secs(), "scheduler started");
        true
    }

    /// Running → Stopped. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let running = self.inner.lock_state().running.take();
        match running {
            Some(r) => {
                r.cancel.cancel();
                tracing::info!(target: "monitor", "scheduler stopped");
                self.inner
                    .monitor
                    .log("Monitoring stopped.", Severity::Info);
                true
            }
            None => false,
        }
    }

    /// Run one cycle now, outside the timer. Waits for any cycle in progress.
    /// If the scheduler is running, a `stop()` also cuts this cycle short.
    pub async fn run_cycle(&self) -> CycleSummary {
        let cancel = self
            .inner
            .lock_state()
            .running
            .as_ref()
            .map(|r| r.cancel.clone())
            .unwrap_or_default();
        self.inner.cycle(&cancel).await
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(r) = self.inner.lock_state().running.take() {
            r.cancel.cancel();
        }
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn cycle(&self, cancel: &CancelToken) -> CycleSummary {
        let _guard = self.cycle_lock.lock().await;
        let summary = self.monitor.sweep(cancel).await;

        if summary.cancelled {
            self.monitor
                .log("Cycle stopped before completion.", Severity::Warning);
            return summary;
        }

        let now = Utc::now();
        self.lock_state().last_run = Some(now);
        counter!("monitor_cycles_total").increment(1);
        gauge!("monitor_last_cycle_ts").set(now.timestamp() as f64);

        self.monitor.log(
            &format!(
                "Cycle complete: {} new, {} failed units. Waiting for next interval.",
                summary.reported(),
                summary.failed_units()
            ),
            Severity::Success,
        );
        summary
    }
}

async fn timer_loop(inner: Arc<Inner>, period: Duration, cancel: CancelToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        inner.cycle(&cancel).await;
        if cancel.is_cancelled() {
            break;
        }
        if started.elapsed() > period {
            inner.monitor.log(
                &format!(
                    "Cycle ran longer than the {}-minute interval; missed ticks were skipped.",
                    period.as_secs() / 60
                ),
                Severity::Warning,
            );
        }
    }
    tracing::debug!(target: "monitor", "timer task exited");
}
