//! Pipeline orchestrator: wires the fixed 8-step workflow.
//!
//! Step order and per-step failure policies are declared here as data; the
//! executor honors them. The orchestrator also owns the two run-boundary
//! concerns: the failure notification on a halt and the single
//! `RunLog::finalize` call that covers success, halt, and abort alike.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;

use crate::adapters::{
    ChartRenderer, NewsFetcher, PaperFetcher, PdfRenderer, ReportMailer, RunSummary, SheetUpdater,
};
use crate::analyze::{self, AnalyzerOptions, TrendReport};
use crate::config::PipelineConfig;
use crate::corpus::{self, NewsItem, ResearchItem};
use crate::error::PipelineError;
use crate::executor::{
    Backoff, ExhaustPolicy, FailurePolicy, Payload, RunOutcome, StepContract, StepDescriptor,
    StepExecutor, StepFn, TerminalStatus, ValueKind,
};
use crate::runlog::{
    RunLog, RunRecord, STEP_ANALYZE, STEP_CHARTS, STEP_EMAIL, STEP_FETCH_NEWS, STEP_FETCH_PAPERS,
    STEP_PDF, STEP_SHEET,
};

/// External collaborators injected at the boundary.
#[derive(Clone)]
pub struct Adapters {
    pub news: Arc<dyn NewsFetcher>,
    pub papers: Arc<dyn PaperFetcher>,
    pub charts: Arc<dyn ChartRenderer>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub sheet: Arc<dyn SheetUpdater>,
    pub mailer: Arc<dyn ReportMailer>,
}

/// Outcome handed back to the binary.
#[derive(Debug)]
pub struct CompletedRun {
    pub status: TerminalStatus,
    pub record: RunRecord,
    pub log_path: std::path::PathBuf,
}

pub struct PipelineOrchestrator {
    cfg: PipelineConfig,
    adapters: Adapters,
    executor: StepExecutor,
}

fn extend(input: &Payload, fields: Vec<(&'static str, Payload)>) -> Payload {
    let mut map = match input {
        Payload::Object(m) => m.clone(),
        _ => serde_json::Map::new(),
    };
    for (key, value) in fields {
        map.insert(key.to_string(), value);
    }
    Payload::Object(map)
}

fn field_str(payload: &Payload, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn report_from_payload(payload: &Payload) -> Result<TrendReport, PipelineError> {
    let analysis = payload
        .get("analysis")
        .cloned()
        .ok_or_else(|| PipelineError::Validation("payload missing `analysis`".to_string()))?;
    serde_json::from_value(analysis)
        .map_err(|e| PipelineError::Validation(format!("malformed analysis payload: {e}")))
}

fn summary_from_payload(payload: &Payload) -> Result<RunSummary, PipelineError> {
    let report = report_from_payload(payload)?;
    Ok(RunSummary {
        run_date: field_str(payload, "run_date"),
        article_count: report.article_count,
        paper_count: report.paper_count,
        top_keywords: report.top_keyword_labels(5),
        trending_theme: report.trending_themes.first().cloned(),
        pdf_path: field_str(payload, "pdf_path"),
        sheet_url: payload
            .get("sheet_url")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

// ---- Step bodies -----------------------------------------------------------

struct FetchNewsStep {
    fetcher: Arc<dyn NewsFetcher>,
    days_back: u32,
    query: String,
    max_items: usize,
}

#[async_trait::async_trait]
impl StepFn for FetchNewsStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let articles = self
            .fetcher
            .fetch_news(self.days_back, &self.query, self.max_items)
            .await
            .map_err(|e| PipelineError::Fetch(format!("{e:#}")))?;
        let count = articles.len();
        let articles = serde_json::to_value(articles)
            .map_err(|e| PipelineError::Validation(format!("serializing articles: {e}")))?;
        Ok(extend(
            &input,
            vec![("articles", articles), ("article_count", json!(count))],
        ))
    }
}

struct FetchPapersStep {
    fetcher: Arc<dyn PaperFetcher>,
    days_back: u32,
    query: String,
    max_items: usize,
}

#[async_trait::async_trait]
impl StepFn for FetchPapersStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let papers = self
            .fetcher
            .fetch_papers(self.days_back, &self.query, self.max_items)
            .await
            .map_err(|e| PipelineError::Fetch(format!("{e:#}")))?;
        let count = papers.len();
        let papers = serde_json::to_value(papers)
            .map_err(|e| PipelineError::Validation(format!("serializing papers: {e}")))?;
        Ok(extend(
            &input,
            vec![("papers", papers), ("paper_count", json!(count))],
        ))
    }
}

/// Normalize + analyze fused into one step: the corpus is built and consumed
/// inside, never leaking raw item lists further down the pipeline.
struct AnalyzeStep {
    opts: AnalyzerOptions,
}

#[async_trait::async_trait]
impl StepFn for AnalyzeStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let articles: Vec<NewsItem> =
            serde_json::from_value(input.get("articles").cloned().unwrap_or(Payload::Null))
                .map_err(|e| PipelineError::Validation(format!("malformed articles: {e}")))?;
        let papers: Vec<ResearchItem> =
            serde_json::from_value(input.get("papers").cloned().unwrap_or(Payload::Null))
                .map_err(|e| PipelineError::Validation(format!("malformed papers: {e}")))?;

        let snapshot = corpus::build_corpus(&articles, &papers)?;
        let report = analyze::analyze(&snapshot, &self.opts)?;
        tracing::info!(
            top_theme = report.trending_themes.first().map(String::as_str).unwrap_or("N/A"),
            keywords = report.top_keywords.len(),
            "trend analysis complete"
        );

        let analysis = serde_json::to_value(&report)
            .map_err(|e| PipelineError::Validation(format!("serializing analysis: {e}")))?;
        Ok(json!({
            "run_date": field_str(&input, "run_date"),
            "analysis": analysis,
        }))
    }
}

struct ChartsStep {
    renderer: Arc<dyn ChartRenderer>,
}

#[async_trait::async_trait]
impl StepFn for ChartsStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let report = report_from_payload(&input)?;
        let charts = self
            .renderer
            .render_charts(&report)
            .await
            .map_err(|e| PipelineError::Render(format!("{e:#}")))?;
        let charts: serde_json::Map<String, Payload> = charts
            .into_iter()
            .map(|(name, path)| (name, json!(path.display().to_string())))
            .collect();
        Ok(extend(&input, vec![("charts", Payload::Object(charts))]))
    }
}

struct PdfStep {
    renderer: Arc<dyn PdfRenderer>,
}

#[async_trait::async_trait]
impl StepFn for PdfStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let report = report_from_payload(&input)?;
        let charts = input
            .get("charts")
            .and_then(|v| v.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| {
                        v.as_str()
                            .map(|s| (k.clone(), std::path::PathBuf::from(s)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let run_date = field_str(&input, "run_date");
        let path = self
            .renderer
            .render_pdf(&report, &charts, &run_date)
            .await
            .map_err(|e| PipelineError::Render(format!("{e:#}")))?;
        Ok(extend(
            &input,
            vec![("pdf_path", json!(path.display().to_string()))],
        ))
    }
}

struct SheetStep {
    updater: Arc<dyn SheetUpdater>,
}

#[async_trait::async_trait]
impl StepFn for SheetStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let summary = summary_from_payload(&input)?;
        let outcome = self
            .updater
            .update_sheet(&summary)
            .await
            .map_err(|e| PipelineError::Delivery(format!("{e:#}")))?;
        if !outcome.updated {
            return Err(PipelineError::Delivery(
                "sheet endpoint reported no update".to_string(),
            ));
        }
        Ok(extend(
            &input,
            vec![
                ("updated", json!(true)),
                ("sheet_url", json!(outcome.sheet_url)),
            ],
        ))
    }
}

struct EmailStep {
    mailer: Arc<dyn ReportMailer>,
}

#[async_trait::async_trait]
impl StepFn for EmailStep {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError> {
        let summary = summary_from_payload(&input)?;
        let sent = self
            .mailer
            .send_report(&summary)
            .await
            .map_err(|e| PipelineError::Delivery(format!("{e:#}")))?;
        if !sent {
            return Err(PipelineError::Delivery(
                "mail transport rejected the report".to_string(),
            ));
        }
        Ok(extend(&input, vec![("sent", json!(true))]))
    }
}

// ---- Orchestrator ----------------------------------------------------------

impl PipelineOrchestrator {
    pub fn new(cfg: PipelineConfig, adapters: Adapters) -> Self {
        let backoff = if cfg.backoff_exponential {
            Backoff::exponential(Duration::from_millis(cfg.backoff_base_ms))
        } else {
            Backoff::fixed(Duration::from_millis(cfg.backoff_base_ms))
        };
        Self::with_backoff(cfg, adapters, backoff)
    }

    /// Inject a custom backoff (tests use `Backoff::none()`).
    pub fn with_backoff(cfg: PipelineConfig, adapters: Adapters, backoff: Backoff) -> Self {
        Self {
            cfg,
            adapters,
            executor: StepExecutor::new(backoff),
        }
    }

    /// Cooperative cancellation: set the flag and no further step is issued;
    /// the run still finalizes its log with an "aborted" status.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.executor.abort_flag()
    }

    /// The authoritative step order and policy table.
    fn build_steps(&self) -> Vec<StepDescriptor> {
        vec![
            StepDescriptor::new(
                STEP_FETCH_NEWS,
                FailurePolicy::Stop,
                Box::new(FetchNewsStep {
                    fetcher: Arc::clone(&self.adapters.news),
                    days_back: self.cfg.days_back,
                    query: self.cfg.news_query.clone(),
                    max_items: self.cfg.max_articles,
                }),
            )
            .with_contract(StepContract::new().require("articles", ValueKind::Array)),
            StepDescriptor::new(
                STEP_FETCH_PAPERS,
                FailurePolicy::Stop,
                Box::new(FetchPapersStep {
                    fetcher: Arc::clone(&self.adapters.papers),
                    days_back: self.cfg.days_back,
                    query: self.cfg.paper_query.clone(),
                    max_items: self.cfg.max_papers,
                }),
            )
            .with_contract(
                StepContract::new()
                    .require("articles", ValueKind::Array)
                    .require("papers", ValueKind::Array),
            ),
            StepDescriptor::new(
                STEP_ANALYZE,
                FailurePolicy::Stop,
                Box::new(AnalyzeStep {
                    opts: self.cfg.analyzer.clone(),
                }),
            )
            .with_contract(StepContract::new().require("analysis", ValueKind::Object)),
            StepDescriptor::new(
                STEP_CHARTS,
                FailurePolicy::Stop,
                Box::new(ChartsStep {
                    renderer: Arc::clone(&self.adapters.charts),
                }),
            )
            .with_contract(StepContract::new().require("charts", ValueKind::Object)),
            StepDescriptor::new(
                STEP_PDF,
                FailurePolicy::Stop,
                Box::new(PdfStep {
                    renderer: Arc::clone(&self.adapters.pdf),
                }),
            )
            .with_contract(StepContract::new().require("pdf_path", ValueKind::String)),
            StepDescriptor::new(
                STEP_SHEET,
                FailurePolicy::Continue,
                Box::new(SheetStep {
                    updater: Arc::clone(&self.adapters.sheet),
                }),
            )
            .with_contract(StepContract::new().require("updated", ValueKind::Bool)),
            StepDescriptor::new(
                STEP_EMAIL,
                FailurePolicy::Retry {
                    extra_attempts: self.cfg.email_retries,
                    on_exhaust: ExhaustPolicy::Stop,
                },
                Box::new(EmailStep {
                    mailer: Arc::clone(&self.adapters.mailer),
                }),
            )
            .with_contract(StepContract::new().require("sent", ValueKind::Bool)),
        ]
    }

    pub async fn run(&self) -> Result<CompletedRun> {
        let start = Utc::now();
        let run_id = start.format("%Y%m%d_%H%M%S").to_string();
        let run_date = start.to_rfc3339();
        let log = RunLog::new(&run_id, start, self.cfg.out_dir.join("logs"));

        tracing::info!(run_id = %run_id, "AI trend report pipeline starting");

        let steps = self.build_steps();
        let seed = json!({ "run_date": run_date });
        let outcome: RunOutcome = self.executor.run(&steps, seed, &log).await;

        if let Some((step, error)) = &outcome.halted_on {
            match self.adapters.mailer.send_failure(&run_date, step, error).await {
                Ok(()) => {
                    log.mark_failure_notification();
                    tracing::info!(step = %step, "failure notification sent");
                }
                Err(e) => {
                    tracing::warn!(step = %step, error = %e, "could not send failure notification");
                }
            }
        }

        // Single finalize call site: reached on success, halt, and abort.
        let log_path = log.finalize(outcome.status)?;
        let record = log.snapshot();

        tracing::info!(
            status = outcome.status.label(),
            articles = record.article_count,
            papers = record.paper_count,
            keywords = record.top_5_keywords.join(", "),
            pdf = %record.pdf_path,
            email = %record.email_status,
            sheets = %record.sheets_status,
            "pipeline run complete"
        );

        Ok(CompletedRun {
            status: outcome.status,
            record,
            log_path,
        })
    }
}
