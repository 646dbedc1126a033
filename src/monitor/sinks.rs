// src/monitor/sinks.rs
//! In-memory log and result sinks, plus a log sink that only emits tracing events.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::monitor::types::{ClassifiedCandidate, LogEntry, LogSink, ResultSink, Severity};

pub const DEFAULT_LOG_CAP: usize = 100;
pub const DEFAULT_RESULTS_CAP: usize = 500;

pub(crate) fn trace_entry(message: &str, severity: Severity) {
    match severity {
        Severity::Info => tracing::info!(target: "monitor", "{message}"),
        Severity::Success => tracing::info!(target: "monitor", outcome = "success", "{message}"),
        Severity::Warning => tracing::warn!(target: "monitor", "{message}"),
        Severity::Error => tracing::error!(target: "monitor", "{message}"),
    }
}

/// Log sink that forwards to `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log(&self, message: &str, severity: Severity) {
        trace_entry(message, severity);
    }
}

/// Bounded, newest-first event log. Every entry is also traced.
#[derive(Debug)]
pub struct MemoryLog {
    cap: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAP)
    }
}

impl MemoryLog {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Mutex::new(VecDeque::with_capacity(cap.max(1))),
        }
    }

    /// Newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut e) = self.entries.lock() {
            e.clear();
        }
    }
}

impl LogSink for MemoryLog {
    fn log(&self, message: &str, severity: Severity) {
        trace_entry(message, severity);
        if let Ok(mut e) = self.entries.lock() {
            e.push_front(LogEntry::new(message, severity));
            e.truncate(self.cap);
        }
    }
}

#[derive(Debug, Default)]
struct ResultsState {
    seen: HashSet<String>,
    found: VecDeque<ClassifiedCandidate>,
}

/// Deduplicating result store. The visible list is capped; the seen-id set is not,
/// so an id is never reported as new twice over the store's lifetime.
#[derive(Debug)]
pub struct MemoryResults {
    cap: usize,
    state: Mutex<ResultsState>,
}

impl Default for MemoryResults {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RESULTS_CAP)
    }
}

impl MemoryResults {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            state: Mutex::new(ResultsState::default()),
        }
    }

    /// Newest first.
    pub fn found(&self) -> Vec<ClassifiedCandidate> {
        self.state
            .lock()
            .map(|s| s.found.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.found.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the visible list; ids stay tracked.
    pub fn clear_found(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.found.clear();
        }
    }
}

#[async_trait::async_trait]
impl ResultSink for MemoryResults {
    async fn is_tracked(&self, id: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.seen.contains(id))
            .unwrap_or(false)
    }

    async fn report_found(&self, found: Vec<ClassifiedCandidate>) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        for c in found {
            if s.seen.insert(c.candidate.id.clone()) {
                s.found.push_front(c);
            }
        }
        let cap = self.cap;
        s.found.truncate(cap);
    }
}
