//! Job-terminal errors.

use crate::provider::ProviderError;
use canvasforge_capture::CaptureError;
use canvasforge_core::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Why a job did not produce results. Each variant renders as one
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Provider did not finish within {}s", .elapsed.as_secs())]
    Timeout { elapsed: Duration },
}

impl JobError {
    /// Whether the job was rejected before it started.
    pub fn is_validation(&self) -> bool {
        matches!(self, JobError::Validation(_))
    }
}

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;
