// src/monitor/providers/fixture.rs
//! Search collaborator backed by a fixed set of posts, evaluated locally.
//!
//! Understands the query shapes the planner emits:
//! - `r/<community>`                       community feed
//! - `subreddit:<community> (a OR b ...)`  terms scoped to a community
//! - `author:<name>`                        everything by an author
//! - `a OR b ...`                           terms anywhere

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;

use crate::config::{normalize_author, normalize_community};
use crate::monitor::types::{Candidate, RawCandidate, SearchProvider, SortMode};

/// Results per page, as requested from the platform.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    Feed(String),
    Scoped { community: String, terms: Vec<String> },
    Author(String),
    Terms(Vec<String>),
}

fn split_terms(s: &str) -> Vec<String> {
    s.split(" OR ")
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_query(q: &str) -> Query {
    let q = q.trim();
    if let Some(rest) = q.strip_prefix("author:") {
        return Query::Author(normalize_author(rest));
    }
    if let Some(rest) = q.strip_prefix("subreddit:") {
        let (community, tail) = rest.split_once(' ').unwrap_or((rest, ""));
        let tail = tail.trim().trim_start_matches('(').trim_end_matches(')');
        return Query::Scoped {
            community: normalize_community(community),
            terms: split_terms(tail),
        };
    }
    if q.starts_with("r/") && !q.contains(' ') {
        return Query::Feed(normalize_community(q));
    }
    Query::Terms(split_terms(q))
}

fn any_term(c: &Candidate, terms: &[String]) -> bool {
    let text = c.text().to_lowercase();
    terms.iter().any(|t| text.contains(t.as_str()))
}

fn matches(c: &Candidate, q: &Query) -> bool {
    match q {
        Query::Feed(community) => normalize_community(&c.community) == *community,
        Query::Scoped { community, terms } => {
            normalize_community(&c.community) == *community && any_term(c, terms)
        }
        Query::Author(author) => normalize_author(&c.author) == *author,
        Query::Terms(terms) => any_term(c, terms),
    }
}

pub struct FixtureSearch {
    posts: Vec<Candidate>,
    queries: Mutex<Vec<String>>,
}

impl FixtureSearch {
    pub fn new(posts: Vec<Candidate>) -> Self {
        Self {
            posts,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Build from a JSON array of loosely-typed results. Entries missing an id or
    /// title are skipped with a warning.
    pub fn from_fixture(json: &str) -> Result<Self> {
        let raw: Vec<RawCandidate> =
            serde_json::from_str(json).context("parsing search fixture")?;
        let mut posts = Vec::with_capacity(raw.len());
        for r in raw {
            match Candidate::try_from(r) {
                Ok(c) => posts.push(c),
                Err(e) => tracing::warn!(target: "monitor", error = %e, "skipping fixture entry"),
            }
        }
        Ok(Self::new(posts))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading search fixture {}", path.display()))?;
        Self::from_fixture(&json)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SearchProvider for FixtureSearch {
    async fn search(
        &self,
        sorts: &[SortMode],
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<Candidate>> {
        if let Ok(mut q) = self.queries.lock() {
            q.push(query.to_string());
        }
        let parsed = parse_query(query);
        let limit = PAGE_SIZE * (max_pages.max(1) as usize);
        let tag = sorts.first().copied().unwrap_or(SortMode::New).as_str();
        Ok(self
            .posts
            .iter()
            .filter(|c| matches(c, &parsed))
            .take(limit)
            .cloned()
            .map(|mut c| {
                if c.source.is_empty() {
                    c.source = tag.to_string();
                }
                c
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "FixtureSearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"id": "p1", "title": "Acme pricing question", "subreddit": "SaaS", "author": "alice"},
        {"id": "p2", "title": "WidgetCo outage", "subreddit": "devops", "author": "bob"},
        {"id": "p3", "title": "weekend photos", "subreddit": "pics", "author": "Alice"},
        {"title": "no id here"}
    ]"#;

    #[test]
    fn parses_planner_query_shapes() {
        assert_eq!(parse_query("r/SaaS"), Query::Feed("saas".into()));
        assert_eq!(parse_query("author:alice"), Query::Author("alice".into()));
        assert_eq!(
            parse_query("subreddit:saas (acme OR widgetco)"),
            Query::Scoped {
                community: "saas".into(),
                terms: vec!["acme".into(), "widgetco".into()]
            }
        );
        assert_eq!(
            parse_query("acme cloud OR crm"),
            Query::Terms(vec!["acme cloud".into(), "crm".into()])
        );
    }

    #[tokio::test]
    async fn answers_queries_locally() {
        let s = FixtureSearch::from_fixture(FIXTURE).unwrap();
        assert_eq!(s.len(), 3);

        let feed = s.search(&SortMode::ALL, "r/saas", 1).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].source, "relevance");

        let by_author = s.search(&[SortMode::New], "author:alice", 1).await.unwrap();
        assert_eq!(by_author.len(), 2);

        let global = s.search(&[SortMode::New], "acme OR widgetco", 1).await.unwrap();
        assert_eq!(global.len(), 2);

        let scoped = s
            .search(&[SortMode::New], "subreddit:devops (acme)", 1)
            .await
            .unwrap();
        assert!(scoped.is_empty());

        assert_eq!(s.queries().len(), 4);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(FixtureSearch::from_fixture("{not json").is_err());
    }
}
