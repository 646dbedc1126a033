// tests/scheduler.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mention_monitor::monitor::sinks::{MemoryLog, MemoryResults};
use mention_monitor::monitor::types::{Candidate, SearchProvider, Severity, SortMode};
use mention_monitor::{ConfigHandle, Monitor, MonitorConfig, Scheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Counts calls; optionally parks every call until the gate is opened.
struct CountingSearch {
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl CountingSearch {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }

    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CountingSearch {
    async fn search(
        &self,
        _sorts: &[SortMode],
        query: &str,
        _max_pages: u32,
    ) -> Result<Vec<Candidate>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(vec![Candidate {
            id: format!("{query}-{n}"),
            title: format!("{query} thread"),
            body: None,
            community: "saas".into(),
            author: "x".into(),
            score: 0,
            num_comments: 0,
            timestamp: Utc::now(),
            source: String::new(),
        }])
    }

    fn name(&self) -> &'static str {
        "CountingSearch"
    }
}

fn build(search: Arc<CountingSearch>, terms: &[&str]) -> (Scheduler, Arc<MemoryLog>) {
    let mut cfg = MonitorConfig {
        general_keywords: terms.iter().map(|t| t.to_string()).collect(),
        unit_delay_ms: 0,
        ..Default::default()
    };
    cfg.chunk_sizes.global = 1;
    let log = Arc::new(MemoryLog::default());
    let monitor = Monitor::new(
        search,
        Arc::new(MemoryResults::default()),
        log.clone(),
        Arc::new(ConfigHandle::new(cfg)),
    );
    (Scheduler::with_interval(monitor, 15), log)
}

#[tokio::test(start_paused = true)]
async fn start_runs_immediately_and_second_start_is_a_noop() {
    let search = CountingSearch::new();
    let (sched, log) = build(search.clone(), &["crm"]);

    assert!(!sched.is_running());
    assert!(sched.start());
    assert!(!sched.start());
    assert!(sched.is_running());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(search.count(), 1);
    assert!(sched.state().last_run.is_some());
    assert!(log
        .messages()
        .iter()
        .any(|m| m.starts_with("Cycle complete")));

    // one timer only: exactly one more cycle per interval
    tokio::time::sleep(Duration::from_secs(15 * 60)).await;
    assert_eq!(search.count(), 2);

    assert!(sched.stop());
    assert!(!sched.stop());
}

#[tokio::test(start_paused = true)]
async fn stop_then_start_begins_exactly_one_cycle() {
    let search = CountingSearch::new();
    let (sched, _log) = build(search.clone(), &["crm"]);

    sched.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(search.count(), 1);

    sched.stop();
    sched.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(search.count(), 2);

    sched.stop();
    tokio::time::sleep(Duration::from_secs(60 * 60)).await;
    assert_eq!(search.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_cycle_lets_the_request_finish_then_bails() {
    let gate = Arc::new(Notify::new());
    let search = CountingSearch::gated(gate.clone());
    let (sched, log) = build(search.clone(), &["acme", "crm", "erp"]);

    sched.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(search.count(), 1);

    assert!(sched.stop());
    gate.notify_one();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(search.count(), 1);
    let state = sched.state();
    assert!(!state.is_running);
    assert!(state.last_run.is_none());
    assert!(log.entries().iter().any(|e| {
        e.severity == Severity::Warning && e.message.contains("stopped before completion")
    }));
}

#[tokio::test(start_paused = true)]
async fn stop_during_the_last_unit_still_records_the_run() {
    let gate = Arc::new(Notify::new());
    let search = CountingSearch::gated(gate.clone());
    let (sched, log) = build(search.clone(), &["crm"]);

    sched.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(search.count(), 1);

    assert!(sched.stop());
    gate.notify_one();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let state = sched.state();
    assert!(!state.is_running);
    assert!(state.last_run.is_some());
    let messages = log.messages();
    assert!(messages.iter().any(|m| m.starts_with("Cycle complete")));
    assert!(!messages.iter().any(|m| m.contains("stopped before completion")));
}

#[tokio::test(start_paused = true)]
async fn restart_waits_for_the_stopped_cycle_to_drain() {
    let gate = Arc::new(Notify::new());
    let search = CountingSearch::gated(gate.clone());
    let (sched, _log) = build(search.clone(), &["acme", "crm"]);

    sched.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    sched.stop();
    sched.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    // new cycle is queued behind the old one's in-flight request
    assert_eq!(search.count(), 1);

    gate.notify_one();
    tokio::time::sleep(Duration::from_secs(1)).await;
    // old cycle bailed; new cycle issued its first request
    assert_eq!(search.count(), 2);

    gate.notify_one();
    tokio::time::sleep(Duration::from_secs(1)).await;
    gate.notify_one();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(search.count(), 3);
    assert!(sched.state().last_run.is_some());
    sched.stop();
}

#[tokio::test]
async fn interval_changes_only_while_stopped() {
    let (sched, _log) = build(CountingSearch::new(), &[]);
    assert_eq!(sched.state().interval_minutes, 15);
    assert!(sched.set_interval_minutes(0).is_err());
    sched.set_interval_minutes(5).unwrap();
    assert_eq!(sched.state().interval_minutes, 5);

    sched.start();
    assert!(sched.set_interval_minutes(30).is_err());
    sched.stop();
    sched.set_interval_minutes(30).unwrap();
}

#[tokio::test]
async fn manual_cycle_records_last_run() {
    let search = CountingSearch::new();
    let (sched, _log) = build(search.clone(), &["crm", "erp"]);
    let summary = sched.run_cycle().await;
    assert_eq!(summary.global.units, 2);
    assert_eq!(summary.reported(), 2);
    assert!(summary.community.skipped);
    assert!(summary.author.skipped);
    assert!(sched.state().last_run.is_some());
    assert!(!sched.is_running());
}
