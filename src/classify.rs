// src/classify.rs
//! Keyword classifier: tags a text blob with a keyword category and an intent level.
//!
//! Matching is whole-word and case-insensitive. A keyword is regex-escaped and
//! bounded by `\b` on every side that starts/ends with a word character, so
//! `"api"` does not hit `"rapid"` while `"c++"` still hits `"c++ rocks"`.
//! Compiled patterns are cached process-wide.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Brand,
    Competitor,
    General,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Brand => "brand",
            Category::Competitor => "competitor",
            Category::General => "general",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Low,
    Medium,
    High,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Intent::High => "high",
            Intent::Medium => "medium",
            Intent::Low => "low",
        })
    }
}

/// High/medium intent phrase lists. Defaults are buying and evaluation signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentKeywords {
    #[serde(default = "default_high_intent")]
    pub high: Vec<String>,
    #[serde(default = "default_medium_intent")]
    pub medium: Vec<String>,
}

impl Default for IntentKeywords {
    fn default() -> Self {
        Self {
            high: default_high_intent(),
            medium: default_medium_intent(),
        }
    }
}

fn default_high_intent() -> Vec<String> {
    [
        "looking for",
        "recommend",
        "suggestion",
        "alternative to",
        "vs",
        "comparison",
        "review",
        "best",
        "help with",
        "how to",
        "pricing",
        "cost",
        "software",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_medium_intent() -> Vec<String> {
    [
        "issues with",
        "problem",
        "error",
        "question",
        "anyone used",
        "thoughts on",
        "experience with",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// keyword (lower-cased) -> compiled pattern; `None` records a compile failure
static PATTERNS: Lazy<RwLock<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn build_pattern(keyword: &str) -> Option<Regex> {
    let escaped = regex::escape(keyword);
    let lead = if keyword.chars().next().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    let tail = if keyword.chars().last().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    Regex::new(&format!("(?iu){lead}{escaped}{tail}")).ok()
}

fn compiled(keyword: &str) -> Option<Regex> {
    if let Ok(cache) = PATTERNS.read() {
        if let Some(hit) = cache.get(keyword) {
            return hit.clone();
        }
    }
    let re = build_pattern(keyword);
    if re.is_none() {
        tracing::debug!(
            target: "monitor",
            keyword,
            "keyword pattern failed to compile; using substring match"
        );
    }
    if let Ok(mut cache) = PATTERNS.write() {
        cache.insert(keyword.to_string(), re.clone());
    }
    re
}

/// Whole-word, case-insensitive keyword test. Never errors: a keyword whose
/// pattern can't be compiled falls back to substring containment.
pub fn matches_keyword(text: &str, keyword: &str) -> bool {
    let kw = keyword.trim().to_lowercase();
    if kw.is_empty() || text.is_empty() {
        return false;
    }
    match compiled(&kw) {
        Some(re) => re.is_match(text),
        None => text.to_lowercase().contains(&kw),
    }
}

fn any_match<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|k| matches_keyword(text, k.as_ref()))
}

/// Brand wins over competitor; no match is `General`.
pub fn classify_category<S: AsRef<str>>(
    text: &str,
    brand_keywords: &[S],
    competitor_keywords: &[S],
) -> Category {
    let text = text.to_lowercase();
    if any_match(&text, brand_keywords) {
        Category::Brand
    } else if any_match(&text, competitor_keywords) {
        Category::Competitor
    } else {
        Category::General
    }
}

/// High wins over medium; no match is `Low`.
pub fn classify_intent<S: AsRef<str>>(
    text: &str,
    high_intent_keywords: &[S],
    medium_intent_keywords: &[S],
) -> Intent {
    let text = text.to_lowercase();
    if any_match(&text, high_intent_keywords) {
        Intent::High
    } else if any_match(&text, medium_intent_keywords) {
        Intent::Medium
    } else {
        Intent::Low
    }
}
