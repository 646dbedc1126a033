// src/config/monitor.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::IntentKeywords;
use crate::planner::ChunkSizes;

pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_TOML: &str = "config/monitor.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/monitor.json";

fn default_max_pages() -> u32 {
    1
}
fn default_unit_delay_ms() -> u64 {
    1000
}

/// What to monitor and what to ignore. Lists are cleaned by [`MonitorConfig::cleaned`];
/// every comparison against them is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Community names, stored lower-case without the `r/` prefix.
    pub monitored_communities: Vec<String>,
    pub monitored_authors: Vec<String>,
    pub brand_keywords: Vec<String>,
    pub competitor_keywords: Vec<String>,
    pub general_keywords: Vec<String>,
    pub blacklist_keywords: Vec<String>,
    pub blacklist_communities: Vec<String>,
    pub blacklist_authors: Vec<String>,
    pub intent: IntentKeywords,
    /// Candidates matching only general keywords must carry high/medium intent.
    pub require_intent_for_general: bool,
    /// Author scan reports everything a tracked author posts, keyword or not.
    pub author_scan_bypasses_inclusion: bool,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Politeness delay inserted after every scan unit.
    #[serde(default = "default_unit_delay_ms")]
    pub unit_delay_ms: u64,
    pub chunk_sizes: ChunkSizes,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitored_communities: Vec::new(),
            monitored_authors: Vec::new(),
            brand_keywords: Vec::new(),
            competitor_keywords: Vec::new(),
            general_keywords: Vec::new(),
            blacklist_keywords: Vec::new(),
            blacklist_communities: Vec::new(),
            blacklist_authors: Vec::new(),
            intent: IntentKeywords::default(),
            require_intent_for_general: false,
            author_scan_bypasses_inclusion: false,
            max_pages: default_max_pages(),
            unit_delay_ms: default_unit_delay_ms(),
            chunk_sizes: ChunkSizes::default(),
        }
    }
}

/// Strip an `r/` (or `/r/`) prefix and lower-case a community name.
pub fn normalize_community(name: &str) -> String {
    let t = name.trim().trim_start_matches('/');
    let lower = t.to_lowercase();
    match lower.strip_prefix("r/") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Strip a `u/` (or `/u/`) prefix and lower-case an author name.
pub fn normalize_author(name: &str) -> String {
    let t = name.trim().trim_start_matches('/');
    let lower = t.to_lowercase();
    match lower.strip_prefix("u/") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

impl MonitorConfig {
    /// Trim, drop empties and case-insensitive duplicates (first wins, order kept).
    pub fn cleaned(mut self) -> Self {
        self.monitored_communities =
            clean_list(self.monitored_communities.iter().map(|s| normalize_community(s)));
        self.blacklist_communities =
            clean_list(self.blacklist_communities.iter().map(|s| normalize_community(s)));
        self.monitored_authors =
            clean_list(self.monitored_authors.iter().map(|s| normalize_author(s)));
        self.blacklist_authors =
            clean_list(self.blacklist_authors.iter().map(|s| normalize_author(s)));
        self.brand_keywords = clean_list(self.brand_keywords);
        self.competitor_keywords = clean_list(self.competitor_keywords);
        self.general_keywords = clean_list(self.general_keywords);
        self.blacklist_keywords = clean_list(self.blacklist_keywords);
        self.intent.high = clean_list(self.intent.high);
        self.intent.medium = clean_list(self.intent.medium);
        if self.max_pages == 0 {
            self.max_pages = 1;
        }
        self.chunk_sizes = self.chunk_sizes.sanitized();
        self
    }

    /// True when no monitored keyword of any kind is configured.
    pub fn has_keywords(&self) -> bool {
        !(self.brand_keywords.is_empty()
            && self.competitor_keywords.is_empty()
            && self.general_keywords.is_empty())
    }
}

fn clean_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for it in items {
        let t = it.as_ref().trim();
        if t.is_empty() {
            continue;
        }
        if seen.insert(t.to_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<MonitorConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading monitor config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing monitor config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $MONITOR_CONFIG_PATH
/// 2) config/monitor.toml
/// 3) config/monitor.json
/// 4) built-in defaults (nothing monitored)
pub fn load_config_default() -> Result<MonitorConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("MONITOR_CONFIG_PATH points to non-existent path"));
        }
    }
    for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_config_from(&p);
        }
    }
    Ok(MonitorConfig::default())
}

/// Resolve the path the config would be loaded from, if any.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(p));
    }
    [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

pub(crate) fn parse_config(s: &str, hint_ext: &str) -> Result<MonitorConfig> {
    let parsed = if hint_ext == "json" {
        serde_json::from_str::<MonitorConfig>(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| toml::from_str::<MonitorConfig>(s).map_err(anyhow::Error::from))
    } else {
        toml::from_str::<MonitorConfig>(s)
            .map_err(anyhow::Error::from)
            .or_else(|toml_err| {
                serde_json::from_str::<MonitorConfig>(s).map_err(|_| toml_err)
            })
    };
    parsed.map(MonitorConfig::cleaned)
}
