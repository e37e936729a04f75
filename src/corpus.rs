//! Data model for fetched items and the analysis-ready corpus.
//!
//! `build_corpus` is a pure transform: it merges news articles and research
//! papers into a uniform, lower-cased token stream and never touches I/O.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearchItem {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub external_id: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    News,
    Research,
}

impl OriginType {
    pub fn label(&self) -> &'static str {
        match self {
            OriginType::News => "news",
            OriginType::Research => "research",
        }
    }
}

/// One normalized item ready for keyword analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusItem {
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub origin: OriginType,
    /// Publisher name for news, "arxiv" for research.
    pub source_label: String,
}

/// Append-only sequence of normalized items for one run. Built once, then
/// handed to the analyzer as an immutable snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub items: Vec<CorpusItem>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_of(&self, origin: OriginType) -> usize {
        self.items.iter().filter(|i| i.origin == origin).count()
    }
}

/// Lowercase and collapse every non-alphanumeric run to a single space,
/// decoding HTML entities first so "AI&nbsp;safety" tokenizes cleanly.
pub fn normalize_for_analysis(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_lowercase();

    static RE_NON_ALNUM: OnceCell<Regex> = OnceCell::new();
    let re = RE_NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    re.replace_all(&decoded, " ").trim().to_string()
}

fn require_field(value: &str, what: &str, idx: usize) -> Result<(), PipelineError> {
    if value.trim().is_empty() {
        return Err(PipelineError::Validation(format!(
            "{what} missing or blank at index {idx}"
        )));
    }
    Ok(())
}

/// Merge heterogeneous records into a single corpus.
///
/// Malformed input (blank required field) surfaces as a `Validation` error to
/// the caller rather than being silently dropped.
pub fn build_corpus(
    articles: &[NewsItem],
    papers: &[ResearchItem],
) -> Result<Corpus, PipelineError> {
    let mut items = Vec::with_capacity(articles.len() + papers.len());

    for (idx, a) in articles.iter().enumerate() {
        require_field(&a.title, "article title", idx)?;
        require_field(&a.url, "article url", idx)?;
        items.push(CorpusItem {
            text: normalize_for_analysis(&format!("{} {}", a.title, a.description)),
            published_at: a.published_at,
            origin: OriginType::News,
            source_label: a.source.clone(),
        });
    }

    for (idx, p) in papers.iter().enumerate() {
        require_field(&p.title, "paper title", idx)?;
        require_field(&p.external_id, "paper external_id", idx)?;
        items.push(CorpusItem {
            text: normalize_for_analysis(&format!("{} {}", p.title, p.abstract_text)),
            published_at: p.published_at,
            origin: OriginType::Research,
            source_label: "arxiv".to_string(),
        });
    }

    Ok(Corpus { items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(s, 0).unwrap()
    }

    fn article(title: &str, desc: &str) -> NewsItem {
        NewsItem {
            title: title.into(),
            source: "TechWire".into(),
            url: "https://example.test/a".into(),
            published_at: ts(1_700_000_000),
            description: desc.into(),
        }
    }

    #[test]
    fn normalize_lowercases_and_collapses_punctuation() {
        let out = normalize_for_analysis("GPT-5: A &amp; B — what's next?!");
        assert_eq!(out, "gpt 5 a b what s next");
    }

    #[test]
    fn corpus_merges_news_then_papers_in_order() {
        let papers = vec![ResearchItem {
            title: "Scaling Laws".into(),
            authors: vec!["A. Author".into()],
            abstract_text: "We study scaling.".into(),
            external_id: "2401.00001".into(),
            published_at: ts(1_700_000_100),
            categories: BTreeSet::new(),
        }];
        let corpus = build_corpus(&[article("AI News", "big week")], &papers).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.items[0].origin, OriginType::News);
        assert_eq!(corpus.items[0].text, "ai news big week");
        assert_eq!(corpus.items[1].origin, OriginType::Research);
        assert_eq!(corpus.items[1].source_label, "arxiv");
    }

    #[test]
    fn blank_title_is_a_validation_error() {
        let bad = article("   ", "whatever");
        let err = build_corpus(&[bad], &[]).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }
}
