//! AI Trend Report — Binary Entrypoint
//! Runs the scheduled report pipeline once: fetch, analyze, render, deliver.
//!
//! Usage:
//!   ai-trend-report             # run the full pipeline
//!   ai-trend-report --dry-run   # validate configuration only, no I/O

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_trend_report::adapters::{
    ArxivFetcher, NewsApiFetcher, SmtpMailer, SummaryPdfRenderer, SvgChartRenderer,
    WebhookSheetUpdater,
};
use ai_trend_report::executor::TerminalStatus;
use ai_trend_report::orchestrator::{Adapters, PipelineOrchestrator};
use ai_trend_report::PipelineConfig;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ai_trend_report=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let dry_run = std::env::args().any(|a| a == "--dry-run");

    let cfg = PipelineConfig::from_env()?;
    if dry_run {
        tracing::info!("dry run complete; configuration is valid");
        return Ok(());
    }

    let adapters = Adapters {
        news: Arc::new(NewsApiFetcher::new(cfg.news_api_key.clone())),
        papers: Arc::new(ArxivFetcher::new()),
        charts: Arc::new(SvgChartRenderer::new(cfg.out_dir.join("charts"))),
        pdf: Arc::new(SummaryPdfRenderer::new(cfg.out_dir.join("reports"))),
        sheet: Arc::new(WebhookSheetUpdater::new(cfg.sheet_webhook.clone())),
        mailer: Arc::new(SmtpMailer::new(&cfg.email)?),
    };

    let pipeline = PipelineOrchestrator::new(cfg, adapters);
    let run = pipeline.run().await?;

    if run.status != TerminalStatus::Success {
        tracing::error!(status = run.status.label(), "pipeline did not complete");
        std::process::exit(1);
    }
    Ok(())
}
