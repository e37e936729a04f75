//! Run-sheet adapter: append a summary row through a webhook.
//!
//! The sheet side is an Apps Script (or similar) endpoint that accepts a
//! JSON row and answers `{"updated": bool, "sheet_url": "..."}`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;

use super::{RunSummary, SheetOutcome, SheetUpdater};

pub struct WebhookSheetUpdater {
    webhook: String,
    client: Client,
    timeout: Duration,
}

/// Row shape mirrors the sheet columns: date, counts, keywords, theme,
/// artifact path, status, timestamp.
#[derive(Debug, Serialize)]
struct SheetRow<'a> {
    run_date: &'a str,
    article_count: usize,
    paper_count: usize,
    top_keywords: String,
    trending_theme: &'a str,
    pdf_path: &'a str,
    status: &'a str,
    timestamp: String,
}

impl WebhookSheetUpdater {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl SheetUpdater for WebhookSheetUpdater {
    async fn update_sheet(&self, summary: &RunSummary) -> Result<SheetOutcome> {
        let date_only = summary.run_date.get(..10).unwrap_or(&summary.run_date);
        let row = SheetRow {
            run_date: date_only,
            article_count: summary.article_count,
            paper_count: summary.paper_count,
            top_keywords: summary.top_keywords.join(", "),
            trending_theme: summary.trending_theme.as_deref().unwrap_or(""),
            pdf_path: &summary.pdf_path,
            status: "success",
            timestamp: Utc::now().to_rfc3339(),
        };

        let outcome: SheetOutcome = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(&row)
            .send()
            .await
            .context("sheet webhook request")?
            .error_for_status()
            .context("sheet webhook http status")?
            .json()
            .await
            .context("sheet webhook response body")?;

        tracing::info!(updated = outcome.updated, url = %outcome.sheet_url, "sheet row appended");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_serializes_with_stable_fields() {
        let row = SheetRow {
            run_date: "2024-05-01",
            article_count: 3,
            paper_count: 1,
            top_keywords: "agents, safety".into(),
            trending_theme: "general",
            pdf_path: "/tmp/r.pdf",
            status: "success",
            timestamp: "2024-05-01T00:00:00Z".into(),
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["run_date"], "2024-05-01");
        assert_eq!(v["top_keywords"], "agents, safety");
        assert_eq!(v["status"], "success");
    }
}
