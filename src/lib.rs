// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod adapters;
pub mod analyze;
pub mod config;
pub mod corpus;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod runlog;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{analyze, AnalyzerOptions, KeywordCount, ThemeMap, TrendReport};
pub use crate::config::PipelineConfig;
pub use crate::corpus::{build_corpus, Corpus, NewsItem, ResearchItem};
pub use crate::error::PipelineError;
pub use crate::executor::{
    Backoff, ExhaustPolicy, FailurePolicy, Payload, StepContract, StepDescriptor, StepExecutor,
    StepFn, StepResult, StepStatus, TerminalStatus, ValueKind,
};
pub use crate::orchestrator::{Adapters, CompletedRun, PipelineOrchestrator};
pub use crate::runlog::{RunLog, RunRecord};
