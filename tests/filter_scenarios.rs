// tests/filter_scenarios.rs
use chrono::Utc;
use mention_monitor::filter::filter_candidates;
use mention_monitor::{
    classify_category, classify_intent, Candidate, Category, Intent, MonitorConfig,
};

fn cand(id: &str, title: &str, community: &str, author: &str) -> Candidate {
    Candidate {
        id: id.into(),
        title: title.into(),
        body: None,
        community: community.into(),
        author: author.into(),
        score: 0,
        num_comments: 0,
        timestamp: Utc::now(),
        source: "new".into(),
    }
}

#[test]
fn brand_match_with_blacklisted_word_is_dropped() {
    let cfg = MonitorConfig {
        brand_keywords: vec!["acme".into()],
        competitor_keywords: vec!["widgetco".into()],
        blacklist_keywords: vec!["spam".into()],
        ..Default::default()
    };
    let text = "acme vs widgetco, great deal, not spam";
    assert_eq!(
        classify_category(text, &cfg.brand_keywords, &cfg.competitor_keywords),
        Category::Brand
    );
    let (kept, stats) = filter_candidates(vec![cand("1", text, "saas", "bob")], &cfg);
    assert!(kept.is_empty());
    assert_eq!(stats.dropped_keyword, 1);
}

#[test]
fn tracked_author_without_keyword_is_dropped() {
    let cfg = MonitorConfig {
        monitored_authors: vec!["alice".into()],
        brand_keywords: vec!["acme".into()],
        ..Default::default()
    };
    let (kept, stats) = filter_candidates(vec![cand("1", "my new bike", "cycling", "alice")], &cfg);
    assert!(kept.is_empty());
    assert_eq!(stats.dropped_no_match, 1);
}

#[test]
fn community_blacklist_wins_over_any_keyword() {
    let cfg = MonitorConfig {
        brand_keywords: vec!["acme".into()],
        competitor_keywords: vec!["globex".into()],
        general_keywords: vec!["crm".into()],
        blacklist_communities: vec!["r/Giveaways".into()],
        ..Default::default()
    }
    .cleaned();
    let communities = ["giveaways", "GIVEAWAYS", "r/giveaways", "/r/Giveaways"];
    let batch: Vec<Candidate> = communities
        .iter()
        .enumerate()
        .map(|(i, c)| cand(&i.to_string(), "acme globex crm best pricing", c, "x"))
        .collect();
    let (kept, stats) = filter_candidates(batch, &cfg);
    assert!(kept.is_empty());
    assert_eq!(stats.dropped_community, communities.len());
}

#[test]
fn high_intent_wins_whenever_present() {
    let high = vec!["recommend".to_string(), "pricing".to_string()];
    let medium = vec!["problem".to_string(), "question".to_string()];
    let texts = [
        "Quick question: can you recommend a CRM?",
        "Pricing problem with our vendor",
        "PRICING",
    ];
    for t in texts {
        assert_eq!(classify_intent(t, &high, &medium), Intent::High, "{t}");
    }
    assert_eq!(classify_intent("a problem", &high, &medium), Intent::Medium);
    // whole-word: "recommended" is not "recommend"
    assert_eq!(classify_intent("highly recommended", &high, &medium), Intent::Low);
}
