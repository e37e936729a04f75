// tests/providers_arxiv.rs
use chrono::{TimeZone, Utc};

use ai_trend_report::adapters::arxiv::parse_feed;

const FIXTURE: &str = include_str!("fixtures/arxiv_atom.xml");

#[test]
fn fixture_parses_and_applies_cutoff() {
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let papers = parse_feed(FIXTURE, cutoff).unwrap();

    assert_eq!(papers.len(), 1, "the 2023 entry is outside the window");
    let paper = &papers[0];
    assert_eq!(paper.external_id, "2405.01234v1");
    assert_eq!(paper.title, "Scaling Laws for Autonomous Agents");
    assert_eq!(paper.authors, vec!["Ada Lovelace", "Alan Turing"]);
    assert!(paper.categories.contains("cs.AI"));
    assert!(paper.categories.contains("cs.LG"));
    assert!(paper.abstract_text.starts_with("We study"));
}

#[test]
fn everything_kept_with_early_cutoff() {
    let cutoff = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let papers = parse_feed(FIXTURE, cutoff).unwrap();
    assert_eq!(papers.len(), 2);
}

#[test]
fn garbage_xml_is_an_error() {
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(parse_feed("not xml at all <", cutoff).is_err());
}
