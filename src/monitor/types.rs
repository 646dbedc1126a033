// src/monitor/types.rs
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::{Category, Intent};
use crate::config::MonitorConfig;

/// One item returned by the search collaborator, validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub community: String,
    pub author: String,
    pub score: i64,
    pub num_comments: u64,
    pub timestamp: DateTime<Utc>,
    /// Which channel/sort produced it, e.g. "new".
    pub source: String,
}

impl Candidate {
    /// Title and body joined with a space, as matched by filters and classifiers.
    pub fn text(&self) -> String {
        match self.body.as_deref() {
            Some(b) if !b.is_empty() => format!("{} {}", self.title, b),
            _ => self.title.clone(),
        }
    }
}

/// Loosely-typed search result as it comes off the wire. Everything optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCandidate {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "selftext")]
    pub body: Option<String>,
    #[serde(alias = "subreddit")]
    pub community: Option<String>,
    pub author: Option<String>,
    pub score: Option<i64>,
    #[serde(alias = "num_comments")]
    pub comments: Option<i64>,
    /// Unix seconds or milliseconds.
    #[serde(alias = "created_utc")]
    pub timestamp: Option<f64>,
    #[serde(alias = "sort_type")]
    pub source: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CandidateError {
    #[error("search result is missing required field `{0}`")]
    MissingField(&'static str),
}

// Values below this are seconds, above are milliseconds.
const MILLIS_CUTOFF: f64 = 4_100_000_000.0;

fn to_utc(ts: Option<f64>) -> DateTime<Utc> {
    let Some(v) = ts.filter(|v| v.is_finite() && *v > 0.0) else {
        return DateTime::<Utc>::default();
    };
    let millis = if v < MILLIS_CUTOFF { v * 1000.0 } else { v };
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .unwrap_or(DateTime::<Utc>::default())
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<RawCandidate> for Candidate {
    type Error = CandidateError;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let id = non_empty(raw.id).ok_or(CandidateError::MissingField("id"))?;
        let title = non_empty(raw.title).ok_or(CandidateError::MissingField("title"))?;
        Ok(Candidate {
            id,
            title,
            body: non_empty(raw.body),
            community: raw.community.unwrap_or_default().trim().to_string(),
            author: raw.author.unwrap_or_default().trim().to_string(),
            score: raw.score.unwrap_or(0),
            num_comments: raw.comments.unwrap_or(0).max(0) as u64,
            timestamp: to_utc(raw.timestamp),
            source: raw.source.unwrap_or_default(),
        })
    }
}

/// A candidate that survived filtering, with its tags. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCandidate {
    pub candidate: Candidate,
    pub category: Category,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Relevance,
    New,
    Top,
    Comments,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Relevance,
        SortMode::New,
        SortMode::Top,
        SortMode::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::New => "new",
            SortMode::Top => "top",
            SortMode::Comments => "comments",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: uuid::Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            message: message.into(),
        }
    }
}

/// External search collaborator. Must be safe to call repeatedly; failures are
/// returned, never panicked.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        sorts: &[SortMode],
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<Candidate>>;
    fn name(&self) -> &'static str;
}

/// Deduplicating store for surfaced candidates.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    /// Whether `id` has ever been reported.
    async fn is_tracked(&self, id: &str) -> bool;
    /// Record newly found candidates; already-seen ids are ignored.
    async fn report_found(&self, found: Vec<ClassifiedCandidate>);
}

/// Append-only event log. Must not block the scan loop.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str, severity: Severity);
}

/// Read access to the latest configuration. Called once per unit.
pub trait ConfigSource: Send + Sync {
    fn current(&self) -> MonitorConfig;
}

impl ConfigSource for MonitorConfig {
    fn current(&self) -> MonitorConfig {
        self.clone()
    }
}
