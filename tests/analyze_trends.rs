// tests/analyze_trends.rs
// Fetch-shaped items in, trend report out: build_corpus + analyze as one
// pure transform.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};

use ai_trend_report::analyze::{analyze, AnalyzerOptions};
use ai_trend_report::corpus::{build_corpus, NewsItem, ResearchItem};

fn article(title: &str, source: &str, slug: &str, ts: i64) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        source: source.to_string(),
        url: format!("https://example.test/{slug}"),
        published_at: Utc.timestamp_opt(ts, 0).unwrap(),
        description: String::new(),
    }
}

fn paper(title: &str, abstract_text: &str, id: &str, ts: i64) -> ResearchItem {
    ResearchItem {
        title: title.to_string(),
        authors: vec!["A. Researcher".to_string()],
        abstract_text: abstract_text.to_string(),
        external_id: id.to_string(),
        published_at: Utc.timestamp_opt(ts, 0).unwrap(),
        categories: BTreeSet::from(["cs.AI".to_string()]),
    }
}

#[test]
fn phrase_anchored_by_a_short_word_outranks_singletons() {
    // "ai" alone is below the token length floor, but "ai safety" is a
    // keyword in its own right and must win on document frequency.
    let articles = vec![
        article("AI Safety", "Daily AI", "a", 1_700_000_000),
        article("AI Safety", "TechWire", "b", 1_700_086_400),
        article("Quantum Computing", "Daily AI", "c", 1_700_172_800),
    ];
    let papers = vec![paper("AI Safety", "", "2405.00001", 1_700_259_200)];

    let corpus = build_corpus(&articles, &papers).unwrap();
    let report = analyze(&corpus, &AnalyzerOptions::default()).unwrap();

    assert_eq!(report.top_keywords[0].keyword, "ai safety");
    assert_eq!(report.top_keywords[0].count, 3);

    let quantum = report
        .top_keywords
        .iter()
        .position(|k| k.keyword == "quantum computing")
        .unwrap();
    assert_eq!(report.top_keywords[quantum].count, 1);
    assert!(quantum > 0, "a count-1 phrase never outranks a count-3 one");

    // Both "ai safety" and "safety" map to the same theme; the quantum
    // singletons are unmapped noise below the general-bucket floor.
    assert_eq!(report.trending_themes, vec!["AI Safety & Alignment"]);

    assert_eq!(report.article_count, 3);
    assert_eq!(report.paper_count, 1);
    assert_eq!(report.summary.total_items, 4);
    assert_eq!(report.summary.most_active_source, "Daily AI");
    assert_eq!(report.summary.date_range, "2023-11-14 to 2023-11-17");
}

#[test]
fn html_entities_and_case_normalize_before_counting() {
    let articles = vec![
        article("Transformers &amp; Agents", "Wire", "a", 1_700_000_000),
        article("TRANSFORMERS, agents!", "Wire", "b", 1_700_000_100),
    ];
    let corpus = build_corpus(&articles, &[]).unwrap();
    let report = analyze(&corpus, &AnalyzerOptions::default()).unwrap();

    let transformers = report
        .top_keywords
        .iter()
        .find(|k| k.keyword == "transformers")
        .unwrap();
    assert_eq!(transformers.count, 2, "entity and case variants collapse");
}

#[test]
fn repetition_inside_one_item_counts_once() {
    let papers = vec![paper(
        "Diffusion models",
        "diffusion diffusion diffusion everywhere",
        "2405.00002",
        1_700_000_000,
    )];
    let corpus = build_corpus(&[], &papers).unwrap();
    let report = analyze(&corpus, &AnalyzerOptions::default()).unwrap();

    let diffusion = report
        .top_keywords
        .iter()
        .find(|k| k.keyword == "diffusion")
        .unwrap();
    assert_eq!(diffusion.count, 1);
}

#[test]
fn same_corpus_always_yields_the_same_report() {
    let articles = vec![
        article("Agents planning benchmarks", "Wire", "a", 1_700_000_000),
        article("Benchmarks for planning agents", "Post", "b", 1_700_000_100),
    ];
    let papers = vec![paper(
        "Reasoning agents",
        "We benchmark reasoning.",
        "2405.00003",
        1_700_000_200,
    )];
    let corpus = build_corpus(&articles, &papers).unwrap();
    let opts = AnalyzerOptions::default();

    let first = analyze(&corpus, &opts).unwrap();
    let second = analyze(&corpus, &opts).unwrap();
    assert_eq!(first, second);
}
