// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod config;
pub mod filter;
pub mod monitor;
pub mod planner;

// ---- Re-exports for stable public API ----
pub use crate::classify::{classify_category, classify_intent, Category, Intent};
pub use crate::config::{ConfigHandle, MonitorConfig};
pub use crate::filter::filter_candidates;
pub use crate::monitor::cancel::CancelToken;
pub use crate::monitor::scheduler::{CycleState, Scheduler};
pub use crate::monitor::types::{Candidate, ClassifiedCandidate, LogEntry, Severity, SortMode};
pub use crate::monitor::{CycleSummary, Monitor};
