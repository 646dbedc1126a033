// src/planner.rs
//! Query planner: splits keyword lists into bounded chunks and renders one search
//! query per chunk. Terms are joined unquoted, so multi-word keywords match
//! broadly (`acme cloud OR widgetco`); that is the intended behaviour.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::MonitorConfig;

/// Max terms per query, per channel. Community scans use smaller chunks so each
/// keyword gets more of the per-query result budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSizes {
    pub community: usize,
    pub global: usize,
}

impl Default for ChunkSizes {
    fn default() -> Self {
        Self {
            community: 5,
            global: 10,
        }
    }
}

impl ChunkSizes {
    pub fn sanitized(self) -> Self {
        Self {
            community: self.community.max(1),
            global: self.global.max(1),
        }
    }
}

/// Partition `terms` into consecutive chunks of at most `size` (0 is treated as 1).
pub fn chunk_terms<S: AsRef<str>>(terms: &[S], size: usize) -> Vec<Vec<String>> {
    terms
        .chunks(size.max(1))
        .map(|c| c.iter().map(|t| t.as_ref().to_string()).collect())
        .collect()
}

/// Next chunk of at most `size` terms not yet in `covered` (compared
/// case-insensitively), marking them covered. Empty once every term is covered.
///
/// Channels call this against the latest config before each unit, so terms
/// removed mid-sweep are never queried and terms added mid-sweep still are.
pub fn next_chunk<S: AsRef<str>>(
    terms: &[S],
    covered: &mut HashSet<String>,
    size: usize,
) -> Vec<String> {
    let mut chunk = Vec::new();
    for term in terms {
        if chunk.len() == size.max(1) {
            break;
        }
        let term = term.as_ref();
        if covered.insert(term.to_lowercase()) {
            chunk.push(term.to_string());
        }
    }
    chunk
}

pub fn or_query<S: AsRef<str>>(chunk: &[S]) -> String {
    chunk
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Keyword chunk scoped to one community: `subreddit:<name> (a OR b)`.
pub fn community_query<S: AsRef<str>>(community: &str, chunk: &[S]) -> String {
    format!("subreddit:{community} ({})", or_query(chunk))
}

/// A community's plain feed.
pub fn community_feed_query(community: &str) -> String {
    format!("r/{community}")
}

pub fn author_query(author: &str) -> String {
    format!("author:{author}")
}

/// Brand, competitor and general keywords, in that order.
pub fn monitored_terms(cfg: &MonitorConfig) -> Vec<String> {
    cfg.brand_keywords
        .iter()
        .chain(cfg.competitor_keywords.iter())
        .chain(cfg.general_keywords.iter())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_every_term_once_in_order() {
        let terms: Vec<String> = (0..23).map(|i| format!("kw{i}")).collect();
        for size in [0usize, 1, 4, 5, 10, 23, 50] {
            let chunks = chunk_terms(&terms, size);
            assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size.max(1)));
            let flat: Vec<String> = chunks.into_iter().flatten().collect();
            assert_eq!(flat, terms, "size {size}");
        }
        assert!(chunk_terms::<String>(&[], 5).is_empty());
    }

    #[test]
    fn next_chunk_matches_static_chunking_without_edits() {
        let terms: Vec<String> = (0..12).map(|i| format!("kw{i}")).collect();
        let mut covered = HashSet::new();
        let mut walked = Vec::new();
        loop {
            let chunk = next_chunk(&terms, &mut covered, 5);
            if chunk.is_empty() {
                break;
            }
            walked.push(chunk);
        }
        assert_eq!(walked, chunk_terms(&terms, 5));
    }

    #[test]
    fn next_chunk_follows_list_edits() {
        let mut covered = HashSet::new();
        assert_eq!(next_chunk(&["a", "b", "c", "d"], &mut covered, 2), vec!["a", "b"]);
        // "c" removed, "e" added between units
        assert_eq!(next_chunk(&["a", "b", "d", "e"], &mut covered, 2), vec!["d", "e"]);
        assert!(next_chunk(&["A", "d"], &mut covered, 2).is_empty());
        // duplicates inside one list are queried once
        let mut fresh = HashSet::new();
        assert_eq!(next_chunk(&["x", "X", "y"], &mut fresh, 3), vec!["x", "y"]);
    }

    #[test]
    fn queries_are_unquoted_disjunctions() {
        let chunk = ["acme cloud", "widgetco"];
        assert_eq!(or_query(&chunk), "acme cloud OR widgetco");
        assert_eq!(
            community_query("webdev", &chunk),
            "subreddit:webdev (acme cloud OR widgetco)"
        );
        assert_eq!(community_feed_query("webdev"), "r/webdev");
        assert_eq!(author_query("alice"), "author:alice");
    }

    #[test]
    fn monitored_terms_keep_category_order() {
        let cfg = MonitorConfig {
            brand_keywords: vec!["acme".into()],
            competitor_keywords: vec!["globex".into()],
            general_keywords: vec!["api".into(), "crm".into()],
            ..Default::default()
        };
        assert_eq!(monitored_terms(&cfg), vec!["acme", "globex", "api", "crm"]);
    }
}
