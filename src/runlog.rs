//! Run log: the audit trail of one pipeline execution.
//!
//! A `RunRecord` accumulates in memory behind a mutex during the run and is
//! persisted exactly once — on normal completion or on any abort path. The
//! serialized field names are an external contract (consumers parse the run
//! files); do not rename without a version bump.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::executor::{StepResult, StepStatus, TerminalStatus};

pub const STEP_FETCH_NEWS: &str = "fetch_news";
pub const STEP_FETCH_PAPERS: &str = "fetch_papers";
pub const STEP_ANALYZE: &str = "analyze_trends";
pub const STEP_CHARTS: &str = "generate_charts";
pub const STEP_PDF: &str = "generate_pdf";
pub const STEP_SHEET: &str = "update_sheet";
pub const STEP_EMAIL: &str = "send_email";

/// Persisted record of one run. `steps` and `terminal_status` are additive
/// audit fields; the rest is the stable external schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    pub run_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub article_count: usize,
    pub paper_count: usize,
    pub top_5_keywords: Vec<String>,
    pub pdf_path: String,
    pub email_status: String,
    pub sheets_status: String,
    pub steps: BTreeMap<String, String>,
    pub terminal_status: Option<String>,
}

impl RunRecord {
    fn new(run_id: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.to_string(),
            start_time: start_time.to_rfc3339(),
            end_time: None,
            article_count: 0,
            paper_count: 0,
            top_5_keywords: Vec::new(),
            pdf_path: String::new(),
            email_status: "not_sent".to_string(),
            sheets_status: "not_updated".to_string(),
            steps: BTreeMap::new(),
            terminal_status: None,
        }
    }
}

#[derive(Debug)]
struct Inner {
    record: RunRecord,
    finalized: bool,
}

/// Mutex-guarded run log. Shared by reference across steps; the lock keeps
/// recording safe even if the two terminal branches ever run concurrently.
#[derive(Debug)]
pub struct RunLog {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl RunLog {
    pub fn new(run_id: &str, start_time: DateTime<Utc>, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            inner: Mutex::new(Inner {
                record: RunRecord::new(run_id, start_time),
                finalized: false,
            }),
        }
    }

    /// Record one step's final outcome. Idempotent per step name with
    /// last-write-wins, so a retried step appears once. Known payload keys
    /// (analysis summary, pdf path, delivery outcomes) are folded into the
    /// contract fields.
    pub fn record_step(&self, result: &StepResult) {
        let mut inner = self.inner.lock().expect("run log mutex poisoned");
        let rec = &mut inner.record;

        let status_label = match (&result.status, &result.error) {
            (StepStatus::Success, _) => "success".to_string(),
            (StepStatus::Failed, Some(e)) => format!("failed: {}", e.kind()),
            (StepStatus::Failed, None) => "failed".to_string(),
        };
        rec.steps.insert(result.step_name.clone(), status_label);

        if result.status == StepStatus::Success {
            if let Some(analysis) = result.payload.get("analysis") {
                if let Some(n) = analysis.get("article_count").and_then(|v| v.as_u64()) {
                    rec.article_count = n as usize;
                }
                if let Some(n) = analysis.get("paper_count").and_then(|v| v.as_u64()) {
                    rec.paper_count = n as usize;
                }
                if let Some(top) = analysis.get("top_keywords").and_then(|v| v.as_array()) {
                    rec.top_5_keywords = top
                        .iter()
                        .take(5)
                        .filter_map(|k| k.get("keyword").and_then(|v| v.as_str()))
                        .map(str::to_string)
                        .collect();
                }
            }
            if let Some(path) = result.payload.get("pdf_path").and_then(|v| v.as_str()) {
                rec.pdf_path = path.to_string();
            }
        }

        match result.step_name.as_str() {
            STEP_SHEET => {
                rec.sheets_status = if result.status == StepStatus::Success {
                    "updated".to_string()
                } else {
                    "failed".to_string()
                };
            }
            STEP_EMAIL => {
                rec.email_status = if result.status == StepStatus::Success {
                    "sent".to_string()
                } else {
                    "failed".to_string()
                };
            }
            _ => {}
        }
    }

    /// Mark that the halt notification went out instead of the report mail.
    pub fn mark_failure_notification(&self) {
        let mut inner = self.inner.lock().expect("run log mutex poisoned");
        inner.record.email_status = "failure_notification_sent".to_string();
    }

    pub fn snapshot(&self) -> RunRecord {
        self.inner
            .lock()
            .expect("run log mutex poisoned")
            .record
            .clone()
    }

    /// Path the record will be persisted to.
    pub fn path(&self) -> PathBuf {
        let inner = self.inner.lock().expect("run log mutex poisoned");
        record_path(&self.dir, &inner.record.run_id)
    }

    /// Set `end_time`, stamp the terminal status, and persist the record.
    /// Calling this twice is a programming error.
    pub fn finalize(&self, status: TerminalStatus) -> Result<PathBuf, PipelineError> {
        let mut inner = self.inner.lock().expect("run log mutex poisoned");
        if inner.finalized {
            return Err(PipelineError::AlreadyFinalized);
        }
        inner.record.end_time = Some(Utc::now().to_rfc3339());
        inner.record.terminal_status = Some(status.label().to_string());

        std::fs::create_dir_all(&self.dir)?;
        let path = record_path(&self.dir, &inner.record.run_id);
        let json = serde_json::to_string_pretty(&inner.record)
            .map_err(|e| PipelineError::Validation(format!("run record serialization: {e}")))?;
        std::fs::write(&path, json)?;

        inner.finalized = true;
        tracing::info!(path = %path.display(), status = status.label(), "run record persisted");
        Ok(path)
    }
}

fn record_path(dir: &Path, run_id: &str) -> PathBuf {
    dir.join(format!("run_{run_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::StepResult;
    use serde_json::json;

    fn log_in(dir: &Path) -> RunLog {
        RunLog::new("20240101_120000", Utc::now(), dir)
    }

    #[test]
    fn record_step_is_last_write_wins_per_name() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        log.record_step(&StepResult::failed(
            STEP_SHEET,
            PipelineError::Delivery("503".into()),
        ));
        log.record_step(&StepResult::success(STEP_SHEET, json!({"updated": true})));

        let rec = log.snapshot();
        assert_eq!(rec.steps.len(), 1);
        assert_eq!(rec.steps[STEP_SHEET], "success");
        assert_eq!(rec.sheets_status, "updated");
    }

    #[test]
    fn analysis_payload_folds_into_contract_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        let payload = json!({
            "analysis": {
                "article_count": 12,
                "paper_count": 4,
                "top_keywords": [
                    {"keyword": "agents", "count": 9},
                    {"keyword": "safety", "count": 7},
                ],
            }
        });
        log.record_step(&StepResult::success(STEP_ANALYZE, payload));

        let rec = log.snapshot();
        assert_eq!(rec.article_count, 12);
        assert_eq!(rec.paper_count, 4);
        assert_eq!(rec.top_5_keywords, vec!["agents", "safety"]);
    }

    #[test]
    fn finalize_persists_once_and_rejects_a_second_call() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        let path = log.finalize(TerminalStatus::Success).unwrap();
        assert!(path.exists());

        let err = log.finalize(TerminalStatus::Success).unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyFinalized));

        let written: RunRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.terminal_status.as_deref(), Some("success"));
        assert!(written.end_time.is_some());
    }
}
