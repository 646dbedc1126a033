// src/monitor/mod.rs
pub mod cancel;
pub mod providers;
pub mod scan;
pub mod scheduler;
pub mod sinks;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::monitor::cancel::CancelToken;
use crate::monitor::scan::ScanStats;
use crate::monitor::types::{ConfigSource, LogSink, ResultSink, SearchProvider, Severity};

/// One-time metrics registration (so series show up once a recorder is installed).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_units_total", "Scan units executed, by channel.");
        describe_counter!(
            "monitor_unit_errors_total",
            "Scan units whose search call failed, by channel."
        );
        describe_counter!(
            "monitor_candidates_total",
            "Candidates returned by the search collaborator, by channel."
        );
        describe_counter!(
            "monitor_reported_total",
            "New candidates reported to the result sink, by channel."
        );
        describe_counter!("monitor_cycles_total", "Completed monitoring cycles.");
        describe_gauge!(
            "monitor_last_cycle_ts",
            "Unix ts when the last monitoring cycle completed."
        );
    });
}

/// The collaborators a sweep talks to. Cheap to clone.
#[derive(Clone)]
pub struct Monitor {
    pub(crate) search: Arc<dyn SearchProvider>,
    pub(crate) results: Arc<dyn ResultSink>,
    pub(crate) log: Arc<dyn LogSink>,
    pub(crate) config: Arc<dyn ConfigSource>,
}

impl Monitor {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        results: Arc<dyn ResultSink>,
        log: Arc<dyn LogSink>,
        config: Arc<dyn ConfigSource>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            search,
            results,
            log,
            config,
        }
    }

    pub fn log(&self, message: &str, severity: Severity) {
        self.log.log(message, severity);
    }

    /// Community, author, then global scan, strictly in sequence. Stops between
    /// channels if `cancel` fires.
    pub async fn sweep(&self, cancel: &CancelToken) -> CycleSummary {
        let started_at = Utc::now();
        self.log("Starting monitoring cycle...", Severity::Info);

        let mut summary = CycleSummary {
            started_at,
            ..Default::default()
        };

        // Cut short only if work was abandoned; a stop during the very last unit
        // still leaves a complete cycle.
        summary.community = self.scan_communities(cancel).await;
        summary.cancelled = summary.community.cancelled || cancel.is_cancelled();
        if !summary.cancelled {
            summary.author = self.scan_authors(cancel).await;
            summary.cancelled = summary.author.cancelled || cancel.is_cancelled();
        }
        if !summary.cancelled {
            summary.global = self.scan_global(cancel).await;
            summary.cancelled = summary.global.cancelled;
        }

        summary.finished_at = Some(Utc::now());
        tracing::info!(
            target: "monitor",
            reported = summary.reported(),
            units = summary.units(),
            failed = summary.failed_units(),
            cancelled = summary.cancelled,
            "sweep finished"
        );
        summary
    }
}

/// Outcome of one cycle across the three channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub community: ScanStats,
    pub author: ScanStats,
    pub global: ScanStats,
    pub cancelled: bool,
}

impl CycleSummary {
    fn channels(&self) -> [&ScanStats; 3] {
        [&self.community, &self.author, &self.global]
    }

    pub fn reported(&self) -> usize {
        self.channels().iter().map(|s| s.reported).sum()
    }

    pub fn units(&self) -> usize {
        self.channels().iter().map(|s| s.units).sum()
    }

    pub fn failed_units(&self) -> usize {
        self.channels().iter().map(|s| s.failed_units).sum()
    }
}
