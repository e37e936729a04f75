//! Collaborator interfaces at the pipeline boundary.
//!
//! Everything external — news/paper APIs, chart and PDF artifacts, the run
//! sheet, email — sits behind one of these narrow async traits so the
//! orchestrator can be exercised end-to-end with mocks.

pub mod arxiv;
pub mod charts;
pub mod email;
pub mod newsapi;
pub mod pdf;
pub mod sheets;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analyze::TrendReport;
use crate::corpus::{NewsItem, ResearchItem};

pub use arxiv::ArxivFetcher;
pub use charts::SvgChartRenderer;
pub use email::SmtpMailer;
pub use newsapi::NewsApiFetcher;
pub use pdf::SummaryPdfRenderer;
pub use sheets::WebhookSheetUpdater;

/// Condensed run facts handed to the delivery adapters (sheet row, email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_date: String,
    pub article_count: usize,
    pub paper_count: usize,
    pub top_keywords: Vec<String>,
    pub trending_theme: Option<String>,
    pub pdf_path: String,
    #[serde(default)]
    pub sheet_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetOutcome {
    pub updated: bool,
    pub sheet_url: String,
}

#[async_trait]
pub trait NewsFetcher: Send + Sync {
    async fn fetch_news(
        &self,
        days_back: u32,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<NewsItem>>;
}

#[async_trait]
pub trait PaperFetcher: Send + Sync {
    async fn fetch_papers(
        &self,
        days_back: u32,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<ResearchItem>>;
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Returns `chart name -> file path` for every chart produced.
    async fn render_charts(&self, report: &TrendReport) -> Result<BTreeMap<String, PathBuf>>;
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pdf(
        &self,
        report: &TrendReport,
        charts: &BTreeMap<String, PathBuf>,
        run_date: &str,
    ) -> Result<PathBuf>;
}

#[async_trait]
pub trait SheetUpdater: Send + Sync {
    async fn update_sheet(&self, summary: &RunSummary) -> Result<SheetOutcome>;
}

#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Send the success report; `true` when accepted by the transport.
    async fn send_report(&self, summary: &RunSummary) -> Result<bool>;

    /// Distinct notification for a halted run, naming the failed step.
    async fn send_failure(&self, run_date: &str, step: &str, error: &str) -> Result<()>;
}
