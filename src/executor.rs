//! Step executor: the backbone of the pipeline.
//!
//! Runs a declared sequence of named steps strictly in order, each consuming
//! the previous step's validated payload. Failure blast radius is bounded by
//! the step's declared policy (stop / continue / retry-n), execution order is
//! deterministic and auditable, and every step outcome lands in the run log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::error::PipelineError;
use crate::runlog::RunLog;

/// Structured data passed between steps.
pub type Payload = serde_json::Value;

/// One-time metrics registration, so series are described wherever the
/// facade is wired to an exporter.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_steps_total", "Step executions (final outcomes).");
        describe_counter!("pipeline_step_failures_total", "Steps that ended failed.");
        describe_counter!("pipeline_step_retries_total", "Extra attempts issued by retry policies.");
        describe_histogram!("pipeline_step_ms", "Per-step wall time in milliseconds.");
    });
}

/// A pipeline step body. Receives the previous step's payload and returns a
/// new payload or a classified error — raw errors never cross this boundary.
#[async_trait]
pub trait StepFn: Send + Sync {
    async fn call(&self, input: Payload) -> Result<Payload, PipelineError>;
}

/// What to do once a retry budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustPolicy {
    Stop,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Halt the entire run immediately.
    Stop,
    /// Record the failure, forward the previous successful payload unchanged.
    Continue,
    /// Re-invoke up to `extra_attempts` more times, then apply `on_exhaust`.
    Retry {
        extra_attempts: u32,
        on_exhaust: ExhaustPolicy,
    },
}

impl FailurePolicy {
    fn extra_attempts(&self) -> u32 {
        match self {
            FailurePolicy::Retry { extra_attempts, .. } => *extra_attempts,
            _ => 0,
        }
    }

    fn on_exhaust(&self) -> ExhaustPolicy {
        match self {
            FailurePolicy::Stop => ExhaustPolicy::Stop,
            FailurePolicy::Continue => ExhaustPolicy::Continue,
            FailurePolicy::Retry { on_exhaust, .. } => *on_exhaust,
        }
    }
}

/// Parameterized inter-attempt delay. Tests inject `Backoff::none()` for
/// deterministic zero-delay retries.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub exponential: bool,
}

impl Backoff {
    pub fn fixed(base: Duration) -> Self {
        Self {
            base,
            exponential: false,
        }
    }

    pub fn exponential(base: Duration) -> Self {
        Self {
            base,
            exponential: true,
        }
    }

    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        if self.exponential {
            self.base * 2u32.saturating_pow(retry.saturating_sub(1))
        } else {
            self.base
        }
    }
}

/// Expected JSON kind for a contract key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Bool,
    Array,
    Object,
}

impl ValueKind {
    fn matches(&self, v: &Payload) -> bool {
        match self {
            ValueKind::String => v.is_string(),
            ValueKind::Number => v.is_number(),
            ValueKind::Bool => v.is_boolean(),
            ValueKind::Array => v.is_array(),
            ValueKind::Object => v.is_object(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

/// Structural contract a step's output must satisfy before it is accepted as
/// the next step's input. A violation counts as a failure of the producing
/// step, under that step's own policy.
#[derive(Debug, Clone, Default)]
pub struct StepContract {
    required: Vec<(&'static str, ValueKind)>,
}

impl StepContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, key: &'static str, kind: ValueKind) -> Self {
        self.required.push((key, kind));
        self
    }

    pub fn check(&self, payload: &Payload) -> Result<(), PipelineError> {
        for (key, kind) in &self.required {
            match payload.get(key) {
                None => {
                    return Err(PipelineError::Validation(format!(
                        "output missing required key `{key}`"
                    )))
                }
                Some(v) if !kind.matches(v) => {
                    return Err(PipelineError::Validation(format!(
                        "output key `{key}` is not a {}",
                        kind.label()
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
}

/// Immutable record of one step's final outcome.
#[derive(Debug)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    pub payload: Payload,
    pub error: Option<PipelineError>,
}

impl StepResult {
    pub fn success(step_name: &str, payload: Payload) -> Self {
        Self {
            step_name: step_name.to_string(),
            status: StepStatus::Success,
            payload,
            error: None,
        }
    }

    pub fn failed(step_name: &str, error: PipelineError) -> Self {
        Self {
            step_name: step_name.to_string(),
            status: StepStatus::Failed,
            payload: Payload::Null,
            error: Some(error),
        }
    }
}

/// Declarative step: name, body, failure policy, output contract.
pub struct StepDescriptor {
    pub name: &'static str,
    pub policy: FailurePolicy,
    pub contract: StepContract,
    pub step: Box<dyn StepFn>,
}

impl StepDescriptor {
    pub fn new(name: &'static str, policy: FailurePolicy, step: Box<dyn StepFn>) -> Self {
        Self {
            name,
            policy,
            contract: StepContract::new(),
            step,
        }
    }

    pub fn with_contract(mut self, contract: StepContract) -> Self {
        self.contract = contract;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Success,
    Failed,
    Aborted,
}

impl TerminalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TerminalStatus::Success => "success",
            TerminalStatus::Failed => "failed",
            TerminalStatus::Aborted => "aborted",
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: TerminalStatus,
    /// `(step_name, error message)` of the stop-policy failure, if any.
    pub halted_on: Option<(String, String)>,
    /// Last successfully produced payload.
    pub final_payload: Payload,
}

pub struct StepExecutor {
    backoff: Backoff,
    abort: Arc<AtomicBool>,
}

impl StepExecutor {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cooperative cancellation handle: once set, no further steps are
    /// issued and the run terminates as aborted.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Execute steps in order, recording every final outcome in `log`.
    /// The caller owns `RunLog::finalize`, which must run on every exit path.
    pub async fn run(&self, steps: &[StepDescriptor], seed: Payload, log: &RunLog) -> RunOutcome {
        ensure_metrics_described();

        let mut payload = seed;
        let mut status = TerminalStatus::Success;
        let mut halted_on = None;

        for step in steps {
            if self.abort.load(Ordering::SeqCst) {
                tracing::warn!(step = step.name, "abort requested; not issuing step");
                status = TerminalStatus::Aborted;
                break;
            }

            let started = std::time::Instant::now();
            let result = self.run_step(step, &payload).await;
            histogram!("pipeline_step_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
            counter!("pipeline_steps_total").increment(1);

            log.record_step(&result);

            match result.status {
                StepStatus::Success => {
                    tracing::info!(step = step.name, "step succeeded");
                    payload = result.payload;
                }
                StepStatus::Failed => {
                    counter!("pipeline_step_failures_total").increment(1);
                    let message = result
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default();
                    match step.policy.on_exhaust() {
                        ExhaustPolicy::Stop => {
                            tracing::error!(step = step.name, error = %message, "stop-policy failure; halting run");
                            status = TerminalStatus::Failed;
                            halted_on = Some((step.name.to_string(), message));
                            break;
                        }
                        ExhaustPolicy::Continue => {
                            // Previous successful payload flows on unchanged.
                            tracing::warn!(step = step.name, error = %message, "continue-policy failure; proceeding");
                        }
                    }
                }
            }
        }

        RunOutcome {
            status,
            halted_on,
            final_payload: payload,
        }
    }

    /// Run one step through its retry budget; only the final outcome is
    /// surfaced (and recorded).
    async fn run_step(&self, step: &StepDescriptor, input: &Payload) -> StepResult {
        let total_attempts = 1 + step.policy.extra_attempts();
        let mut last_err = PipelineError::Validation(format!("step `{}` never attempted", step.name));

        for attempt in 1..=total_attempts {
            if attempt > 1 {
                counter!("pipeline_step_retries_total").increment(1);
                let delay = self.backoff.delay(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            match step.step.call(input.clone()).await {
                Ok(output) => match step.contract.check(&output) {
                    Ok(()) => return StepResult::success(step.name, output),
                    Err(e) => {
                        tracing::warn!(
                            step = step.name,
                            attempt,
                            total_attempts,
                            error = %e,
                            "step output violated contract"
                        );
                        last_err = e;
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        step = step.name,
                        attempt,
                        total_attempts,
                        kind = e.kind(),
                        error = %e,
                        "step attempt failed"
                    );
                    last_err = e;
                }
            }
        }

        StepResult::failed(step.name, last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles() {
        let b = Backoff::exponential(Duration::from_millis(100));
        assert_eq!(b.delay(1), Duration::from_millis(100));
        assert_eq!(b.delay(2), Duration::from_millis(200));
        assert_eq!(b.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let b = Backoff::fixed(Duration::from_millis(50));
        assert_eq!(b.delay(1), b.delay(4));
    }

    #[test]
    fn contract_flags_missing_and_mistyped_keys() {
        let contract = StepContract::new()
            .require("articles", ValueKind::Array)
            .require("count", ValueKind::Number);

        let ok = serde_json::json!({"articles": [], "count": 0});
        assert!(contract.check(&ok).is_ok());

        let missing = serde_json::json!({"count": 0});
        assert_eq!(contract.check(&missing).unwrap_err().kind(), "validation_error");

        let mistyped = serde_json::json!({"articles": "nope", "count": 0});
        assert!(contract.check(&mistyped).is_err());
    }
}
