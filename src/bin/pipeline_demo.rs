//! Demo that drives the full pipeline with canned fixture adapters — no
//! network, no SMTP. Artifacts land in a temp directory and the run record
//! path is printed at the end.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use ai_trend_report::adapters::{
    NewsFetcher, PaperFetcher, ReportMailer, RunSummary, SheetOutcome, SheetUpdater,
    SummaryPdfRenderer, SvgChartRenderer,
};
use ai_trend_report::config::{EmailConfig, PipelineConfig};
use ai_trend_report::corpus::{NewsItem, ResearchItem};
use ai_trend_report::orchestrator::{Adapters, PipelineOrchestrator};
use ai_trend_report::AnalyzerOptions;

struct FixtureNews;

#[async_trait]
impl NewsFetcher for FixtureNews {
    async fn fetch_news(&self, _: u32, _: &str, _: usize) -> Result<Vec<NewsItem>> {
        Ok(vec![
            NewsItem {
                title: "New agent framework ships".into(),
                source: "TechWire".into(),
                url: "https://example.test/agents".into(),
                published_at: Utc::now() - Duration::days(1),
                description: "agents planning and tool use".into(),
            },
            NewsItem {
                title: "AI safety summit wraps".into(),
                source: "Daily AI".into(),
                url: "https://example.test/safety".into(),
                published_at: Utc::now() - Duration::days(2),
                description: "alignment and safety commitments".into(),
            },
        ])
    }
}

struct FixturePapers;

#[async_trait]
impl PaperFetcher for FixturePapers {
    async fn fetch_papers(&self, _: u32, _: &str, _: usize) -> Result<Vec<ResearchItem>> {
        Ok(vec![ResearchItem {
            title: "Scaling agents with reinforcement learning".into(),
            authors: vec!["A. Researcher".into()],
            abstract_text: "We study agents trained with reinforcement learning.".into(),
            external_id: "2405.00001".into(),
            published_at: Utc::now() - Duration::days(3),
            categories: BTreeSet::from(["cs.AI".to_string()]),
        }])
    }
}

struct StdoutSheet;

#[async_trait]
impl SheetUpdater for StdoutSheet {
    async fn update_sheet(&self, summary: &RunSummary) -> Result<SheetOutcome> {
        println!(
            "sheet row: {} articles={} papers={} keywords=[{}]",
            summary.run_date,
            summary.article_count,
            summary.paper_count,
            summary.top_keywords.join(", ")
        );
        Ok(SheetOutcome {
            updated: true,
            sheet_url: "https://sheets.example.test/demo".into(),
        })
    }
}

struct StdoutMailer;

#[async_trait]
impl ReportMailer for StdoutMailer {
    async fn send_report(&self, summary: &RunSummary) -> Result<bool> {
        println!("email: report for {} ({})", summary.run_date, summary.pdf_path);
        Ok(true)
    }

    async fn send_failure(&self, run_date: &str, step: &str, error: &str) -> Result<()> {
        println!("email: FAILURE at {step} on {run_date}: {error}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let out_dir = std::env::temp_dir().join("ai-trend-report-demo");
    let cfg = PipelineConfig {
        news_api_key: "demo".into(),
        news_query: "artificial intelligence".into(),
        paper_query: "artificial intelligence".into(),
        days_back: 7,
        max_articles: 50,
        max_papers: 30,
        email: EmailConfig {
            host: "smtp.example.test".into(),
            user: "demo".into(),
            password: "demo".into(),
            from: "reports@example.test".into(),
            recipients: vec!["team@example.test".into()],
        },
        sheet_webhook: "https://hooks.example.test/sheet".into(),
        out_dir: out_dir.clone(),
        email_retries: 1,
        backoff_base_ms: 0,
        backoff_exponential: false,
        analyzer: AnalyzerOptions::default(),
    };

    let adapters = Adapters {
        news: Arc::new(FixtureNews),
        papers: Arc::new(FixturePapers),
        charts: Arc::new(SvgChartRenderer::new(out_dir.join("charts"))),
        pdf: Arc::new(SummaryPdfRenderer::new(out_dir.join("reports"))),
        sheet: Arc::new(StdoutSheet),
        mailer: Arc::new(StdoutMailer),
    };

    let run = PipelineOrchestrator::new(cfg, adapters).run().await?;
    println!("status: {}", run.status.label());
    println!("run record: {}", run.log_path.display());
    Ok(())
}
