// src/monitor/scan.rs
//! Channel scanners: community, author and global keyword sweeps.
//!
//! Every channel is a list of units run strictly one after another. A unit is
//! one search call: check the stop flag, read the latest config, pick the next
//! community, author or keyword chunk from it, query, filter, drop
//! already-tracked ids, report, then sleep the politeness delay. A failing unit
//! is logged and the channel moves on.

use metrics::counter;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use super::cancel::CancelToken;
use super::types::{ClassifiedCandidate, Severity, SortMode};
use super::Monitor;
use crate::config::MonitorConfig;
use crate::filter::{filter_blacklisted, filter_candidates};
use crate::planner::{
    author_query, community_feed_query, community_query, monitored_terms, next_chunk, or_query,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Community,
    Author,
    Global,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Community => "community",
            Channel::Author => "author",
            Channel::Global => "global",
        }
    }

    fn sorts(&self) -> &'static [SortMode] {
        match self {
            // recency matters more than popularity for a tracked person
            Channel::Author => &[SortMode::New],
            Channel::Community | Channel::Global => &SortMode::ALL,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub units: usize,
    pub failed_units: usize,
    /// Candidates returned by the search collaborator.
    pub candidates: usize,
    /// Candidates that survived filtering and dedup and were reported.
    pub reported: usize,
    /// Channel had nothing configured and did not run.
    pub skipped: bool,
    /// Channel stopped early because the scheduler was stopped.
    pub cancelled: bool,
}

struct Unit {
    query: String,
    /// Label used in the success log line, e.g. "in r/rust (feed)".
    found_label: String,
}

impl Monitor {
    /// Run one unit against `cfg`, the snapshot it was planned from.
    /// Returns `false` when the stop flag was observed before it ran.
    async fn run_unit(
        &self,
        channel: Channel,
        unit: &Unit,
        cfg: &MonitorConfig,
        cancel: &CancelToken,
        stats: &mut ScanStats,
    ) -> bool {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            return false;
        }

        stats.units += 1;
        counter!("monitor_units_total", "channel" => channel.as_str()).increment(1);

        let found = match self
            .search
            .search(channel.sorts(), &unit.query, cfg.max_pages)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                stats.failed_units += 1;
                counter!("monitor_unit_errors_total", "channel" => channel.as_str()).increment(1);
                tracing::warn!(
                    target: "monitor",
                    error = ?e,
                    provider = self.search.name(),
                    channel = %channel,
                    query = %unit.query,
                    "search failed"
                );
                self.log.log(
                    &format!("Search failed for `{}`: {e}", unit.query),
                    Severity::Error,
                );
                self.pause(cfg.unit_delay_ms, cancel).await;
                return true;
            }
        };

        stats.candidates += found.len();
        counter!("monitor_candidates_total", "channel" => channel.as_str())
            .increment(found.len() as u64);

        let (kept, fstats) = if channel == Channel::Author && cfg.author_scan_bypasses_inclusion {
            filter_blacklisted(found, cfg)
        } else {
            filter_candidates(found, cfg)
        };
        tracing::debug!(
            target: "monitor",
            channel = %channel,
            query = %unit.query,
            kept = fstats.kept,
            dropped = fstats.dropped(),
            "unit filtered"
        );

        let fresh = self.untracked(kept).await;
        if !fresh.is_empty() {
            let n = fresh.len();
            stats.reported += n;
            counter!("monitor_reported_total", "channel" => channel.as_str()).increment(n as u64);
            self.results.report_found(fresh).await;
            self.log
                .log(&format!("Found {n} {}.", unit.found_label), Severity::Success);
        }

        self.pause(cfg.unit_delay_ms, cancel).await;
        true
    }

    /// Drop ids the result store already has, and repeats within the batch.
    async fn untracked(&self, kept: Vec<ClassifiedCandidate>) -> Vec<ClassifiedCandidate> {
        let mut batch_ids = HashSet::new();
        let mut out = Vec::with_capacity(kept.len());
        for c in kept {
            if !batch_ids.insert(c.candidate.id.clone()) {
                continue;
            }
            if self.results.is_tracked(&c.candidate.id).await {
                continue;
            }
            out.push(c);
        }
        out
    }

    async fn pause(&self, delay_ms: u64, cancel: &CancelToken) {
        if delay_ms == 0 || cancel.is_cancelled() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    /// Sweep every monitored community: its feed, then keyword chunks scoped to it.
    pub async fn scan_communities(&self, cancel: &CancelToken) -> ScanStats {
        let mut stats = ScanStats::default();
        let cfg = self.config.current();
        if cfg.monitored_communities.is_empty() {
            self.log.log(
                "No communities configured; skipping community scan.",
                Severity::Warning,
            );
            stats.skipped = true;
            return stats;
        }

        self.log.log(
            &format!(
                "Scanning {} monitored communities...",
                cfg.monitored_communities.len()
            ),
            Severity::Info,
        );

        let mut visited = HashSet::new();
        loop {
            let cfg = self.config.current();
            let next = next_chunk(&cfg.monitored_communities, &mut visited, 1).pop();
            let Some(community) = next else {
                break;
            };
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }
            self.log.log(&format!("Scanning r/{community}..."), Severity::Info);

            let feed = Unit {
                query: community_feed_query(&community),
                found_label: format!("matches in r/{community} (feed)"),
            };
            if !self.run_unit(Channel::Community, &feed, &cfg, cancel, &mut stats).await {
                return stats;
            }

            let mut covered = HashSet::new();
            loop {
                let cfg = self.config.current();
                let listed = cfg
                    .monitored_communities
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&community));
                if !listed {
                    // removed while its chunks were running
                    break;
                }
                let chunk = next_chunk(
                    &monitored_terms(&cfg),
                    &mut covered,
                    cfg.chunk_sizes.community,
                );
                if chunk.is_empty() {
                    break;
                }
                let unit = Unit {
                    query: community_query(&community, &chunk),
                    found_label: format!("keyword matches in r/{community}"),
                };
                if !self.run_unit(Channel::Community, &unit, &cfg, cancel, &mut stats).await {
                    return stats;
                }
            }
        }
        stats
    }

    /// One newest-first query per tracked author.
    pub async fn scan_authors(&self, cancel: &CancelToken) -> ScanStats {
        let mut stats = ScanStats::default();
        let cfg = self.config.current();
        if cfg.monitored_authors.is_empty() {
            self.log.log(
                "No authors configured; skipping author scan.",
                Severity::Warning,
            );
            stats.skipped = true;
            return stats;
        }

        self.log.log(
            &format!("Scanning {} monitored authors...", cfg.monitored_authors.len()),
            Severity::Info,
        );

        let mut visited = HashSet::new();
        loop {
            let cfg = self.config.current();
            let Some(author) = next_chunk(&cfg.monitored_authors, &mut visited, 1).pop() else {
                break;
            };
            let unit = Unit {
                query: author_query(&author),
                found_label: format!("posts by u/{author}"),
            };
            if !self.run_unit(Channel::Author, &unit, &cfg, cancel, &mut stats).await {
                break;
            }
        }
        stats
    }

    /// Platform-wide discovery over all monitored keywords, in large OR chunks.
    pub async fn scan_global(&self, cancel: &CancelToken) -> ScanStats {
        let mut stats = ScanStats::default();
        if monitored_terms(&self.config.current()).is_empty() {
            self.log.log(
                "No keywords configured for global search.",
                Severity::Warning,
            );
            stats.skipped = true;
            return stats;
        }

        self.log
            .log("Running global keyword search...", Severity::Info);

        let mut covered = HashSet::new();
        loop {
            let cfg = self.config.current();
            let chunk = next_chunk(&monitored_terms(&cfg), &mut covered, cfg.chunk_sizes.global);
            if chunk.is_empty() {
                break;
            }
            let query = or_query(&chunk);
            if !cancel.is_cancelled() {
                self.log
                    .log(&format!("Searching global: {query}..."), Severity::Info);
            }
            let unit = Unit {
                query,
                found_label: "matches globally".to_string(),
            };
            if !self.run_unit(Channel::Global, &unit, &cfg, cancel, &mut stats).await {
                break;
            }
        }
        stats
    }
}
