//! arXiv adapter: fetch recent papers from the Atom query API.
//!
//! The feed is sorted by submission date server-side; the trailing-window
//! cutoff is applied client-side on `published`.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;

use super::PaperFetcher;
use crate::corpus::ResearchItem;

const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// "http://arxiv.org/abs/2401.00001v2" -> "2401.00001v2".
fn extract_id(raw: &str) -> String {
    match raw.split_once("/abs/") {
        Some((_, id)) => id.to_string(),
        None => raw.to_string(),
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an Atom feed body, keeping entries published at or after `cutoff`.
/// Public seam for fixture-driven tests.
pub fn parse_feed(xml: &str, cutoff: DateTime<Utc>) -> Result<Vec<ResearchItem>> {
    let feed: Feed = from_str(xml).context("parsing arxiv atom feed")?;

    let mut papers = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let published = match entry
            .published
            .as_deref()
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
        {
            Some(dt) => dt.with_timezone(&Utc),
            None => continue,
        };
        if published < cutoff {
            continue;
        }

        let title = collapse_ws(entry.title.as_deref().unwrap_or_default());
        let id_raw = entry.id.as_deref().unwrap_or_default();
        if title.is_empty() || id_raw.is_empty() {
            continue;
        }

        papers.push(ResearchItem {
            title,
            authors: entry
                .authors
                .into_iter()
                .filter_map(|a| a.name)
                .collect(),
            abstract_text: collapse_ws(entry.summary.as_deref().unwrap_or_default()),
            external_id: extract_id(id_raw),
            published_at: published,
            categories: entry
                .categories
                .into_iter()
                .filter_map(|c| c.term)
                .collect::<BTreeSet<String>>(),
        });
    }
    Ok(papers)
}

impl ArxivFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: ARXIV_API_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for ArxivFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaperFetcher for ArxivFetcher {
    async fn fetch_papers(
        &self,
        days_back: u32,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<ResearchItem>> {
        let cutoff = Utc::now() - ChronoDuration::days(days_back as i64);
        let search_query = format!("all:{query}");
        let max_results = max_items.to_string();

        let body = self
            .client
            .get(&self.base_url)
            .timeout(self.timeout)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .context("arxiv request")?
            .error_for_status()
            .context("arxiv http status")?
            .text()
            .await
            .context("arxiv response body")?;

        let papers = parse_feed(&body, cutoff)?;
        tracing::info!(count = papers.len(), "fetched research papers");
        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_url_reduces_to_bare_id() {
        assert_eq!(extract_id("http://arxiv.org/abs/2401.00001v2"), "2401.00001v2");
        assert_eq!(extract_id("2401.00001"), "2401.00001");
    }

    #[test]
    fn multiline_titles_collapse() {
        assert_eq!(collapse_ws("Scaling\n  Laws for\n  Agents"), "Scaling Laws for Agents");
    }
}
