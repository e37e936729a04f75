//! Classified pipeline errors.
//!
//! Every failure a step can produce is mapped onto one of these kinds before
//! it crosses the step boundary; raw adapter errors never leak out
//! unclassified. `kind()` is the stable label written into the run record.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upstream API unavailable, rate-limited, or returned garbage.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Malformed structured data between steps or in fetched records.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Empty corpus — not a valid "zero trends" result.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Chart or PDF generation failure.
    #[error("render failed: {0}")]
    Render(String),

    /// Sheet or email transport failure.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// RunLog::finalize called twice — a programming invariant violation.
    #[error("run log already finalized")]
    AlreadyFinalized,

    /// Run-log persistence failure. Never crosses a step boundary.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable audit label for run records and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch_error",
            PipelineError::Validation(_) => "validation_error",
            PipelineError::InsufficientData(_) => "insufficient_data",
            PipelineError::Render(_) => "render_error",
            PipelineError::Delivery(_) => "delivery_error",
            PipelineError::AlreadyFinalized => "already_finalized",
            PipelineError::Io(_) => "io_error",
        }
    }
}
