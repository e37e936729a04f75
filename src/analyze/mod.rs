//! Trend analysis: keyword frequency and theme derivation over one corpus
//! snapshot. Pure, I/O-free, and deterministic — the same corpus always
//! yields the same report.

pub mod keywords;
pub mod stopwords;
pub mod themes;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, OriginType};
use crate::error::PipelineError;

pub use keywords::KeywordCount;
pub use themes::ThemeMap;

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub stopwords: HashSet<String>,
    pub theme_map: ThemeMap,
    /// Bound on the ranked keyword list.
    pub top_keywords: usize,
    pub max_themes: usize,
    /// Minimum distinct-item count for an unmapped keyword to surface in the
    /// "general" theme bucket.
    pub min_general_count: u64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            stopwords: stopwords::default_stopwords(),
            theme_map: themes::default_theme_map(),
            top_keywords: 20,
            max_themes: 8,
            min_general_count: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryStats {
    pub total_items: usize,
    /// "YYYY-MM-DD to YYYY-MM-DD" over item publish dates, or "N/A".
    pub date_range: String,
    pub most_active_source: String,
}

/// Derived trend report for one run. Produced once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendReport {
    pub top_keywords: Vec<KeywordCount>,
    pub trending_themes: Vec<String>,
    pub article_count: usize,
    pub paper_count: usize,
    pub summary: SummaryStats,
}

impl TrendReport {
    pub fn top_keyword_labels(&self, n: usize) -> Vec<String> {
        self.top_keywords
            .iter()
            .take(n)
            .map(|k| k.keyword.clone())
            .collect()
    }
}

fn date_range(corpus: &Corpus) -> String {
    let mut dates: Vec<_> = corpus
        .items
        .iter()
        .map(|i| i.published_at.date_naive())
        .collect();
    dates.sort();
    match (dates.first(), dates.last()) {
        (Some(min), Some(max)) => format!("{min} to {max}"),
        _ => "N/A".to_string(),
    }
}

/// Source with the highest item count; ties break alphabetically so the
/// summary is reproducible.
fn most_active_source(corpus: &Corpus) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in &corpus.items {
        *counts.entry(item.source_label.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(source, _)| source.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Analyze one corpus snapshot into a `TrendReport`.
///
/// An empty corpus is `InsufficientData`: a report with zero trends is a
/// valid result, a report over nothing is not, and the pipeline must halt.
pub fn analyze(corpus: &Corpus, opts: &AnalyzerOptions) -> Result<TrendReport, PipelineError> {
    if corpus.is_empty() {
        return Err(PipelineError::InsufficientData(
            "corpus contains no items".to_string(),
        ));
    }

    let top_keywords = keywords::rank_keywords(corpus, &opts.stopwords, opts.top_keywords);
    let trending_themes = themes::derive_themes(
        &top_keywords,
        &opts.theme_map,
        opts.min_general_count,
        opts.max_themes,
    );

    Ok(TrendReport {
        article_count: corpus.count_of(OriginType::News),
        paper_count: corpus.count_of(OriginType::Research),
        summary: SummaryStats {
            total_items: corpus.len(),
            date_range: date_range(corpus),
            most_active_source: most_active_source(corpus),
        },
        top_keywords,
        trending_themes,
    })
}
