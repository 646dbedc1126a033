// src/filter.rs
//! Filter pipeline: blacklist and inclusion rules over a batch of candidates.
//!
//! Per candidate, in order:
//! 1. community blacklist (case-insensitive, `r/` prefix stripped)
//! 2. author blacklist (case-insensitive)
//! 3. blacklist keywords (substring of title + body)
//! 4. inclusion: title + body must contain at least one brand, competitor or
//!    general keyword (substring)
//!
//! Survivors are classified. The transform is pure and idempotent over its own output.

use crate::classify::{classify_category, classify_intent, Category, Intent};
use crate::config::{normalize_author, normalize_community, MonitorConfig};
use crate::monitor::types::{Candidate, ClassifiedCandidate};

/// Why candidates were dropped, for logs and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub dropped_community: usize,
    pub dropped_author: usize,
    pub dropped_keyword: usize,
    pub dropped_no_match: usize,
    pub dropped_low_intent: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.dropped_community
            + self.dropped_author
            + self.dropped_keyword
            + self.dropped_no_match
            + self.dropped_low_intent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Keep,
    BlacklistedCommunity,
    BlacklistedAuthor,
    BlacklistedKeyword,
    NoMonitoredKeyword,
    LowIntent,
}

fn contains_any(haystack_lower: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .map(|n| n.trim().to_lowercase())
        .any(|n| !n.is_empty() && haystack_lower.contains(&n))
}

fn verdict(c: &Candidate, cfg: &MonitorConfig, require_inclusion: bool) -> Verdict {
    let community = normalize_community(&c.community);
    if !community.is_empty()
        && cfg
            .blacklist_communities
            .iter()
            .any(|b| normalize_community(b) == community)
    {
        return Verdict::BlacklistedCommunity;
    }

    let author = normalize_author(&c.author);
    if !author.is_empty()
        && cfg
            .blacklist_authors
            .iter()
            .any(|b| normalize_author(b) == author)
    {
        return Verdict::BlacklistedAuthor;
    }

    let text = c.text().to_lowercase();
    if contains_any(&text, &cfg.blacklist_keywords) {
        return Verdict::BlacklistedKeyword;
    }

    if !require_inclusion {
        return Verdict::Keep;
    }

    let brand = contains_any(&text, &cfg.brand_keywords);
    let competitor = contains_any(&text, &cfg.competitor_keywords);
    let general = contains_any(&text, &cfg.general_keywords);
    if !(brand || competitor || general) {
        return Verdict::NoMonitoredKeyword;
    }

    if cfg.require_intent_for_general && !brand && !competitor {
        let intent = classify_intent(&text, &cfg.intent.high, &cfg.intent.medium);
        if intent == Intent::Low {
            return Verdict::LowIntent;
        }
    }

    Verdict::Keep
}

fn classify(c: Candidate, cfg: &MonitorConfig) -> ClassifiedCandidate {
    let text = c.text();
    let category: Category =
        classify_category(&text, &cfg.brand_keywords, &cfg.competitor_keywords);
    let intent = classify_intent(&text, &cfg.intent.high, &cfg.intent.medium);
    ClassifiedCandidate {
        candidate: c,
        category,
        intent,
    }
}

fn run(
    candidates: Vec<Candidate>,
    cfg: &MonitorConfig,
    require_inclusion: bool,
) -> (Vec<ClassifiedCandidate>, FilterStats) {
    let mut stats = FilterStats::default();
    let mut out = Vec::with_capacity(candidates.len());
    for c in candidates {
        match verdict(&c, cfg, require_inclusion) {
            Verdict::Keep => {
                stats.kept += 1;
                out.push(classify(c, cfg));
            }
            Verdict::BlacklistedCommunity => stats.dropped_community += 1,
            Verdict::BlacklistedAuthor => stats.dropped_author += 1,
            Verdict::BlacklistedKeyword => stats.dropped_keyword += 1,
            Verdict::NoMonitoredKeyword => stats.dropped_no_match += 1,
            Verdict::LowIntent => stats.dropped_low_intent += 1,
        }
    }
    (out, stats)
}

/// Apply all four rules and classify the survivors.
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    cfg: &MonitorConfig,
) -> (Vec<ClassifiedCandidate>, FilterStats) {
    run(candidates, cfg, true)
}

/// Blacklists only: used by the author channel when it is configured to report
/// everything a tracked author posts.
pub fn filter_blacklisted(
    candidates: Vec<Candidate>,
    cfg: &MonitorConfig,
) -> (Vec<ClassifiedCandidate>, FilterStats) {
    run(candidates, cfg, false)
}
