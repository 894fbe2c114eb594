//! Validation errors surfaced by the engine.
//!
//! Validation failures are reported immediately, never retried, and never
//! start a job.

use crate::objects::{ObjectId, ObjectRef};
use thiserror::Error;

/// A request that was rejected before any work started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid aspect ratio '{0}', expected a value like \"16:9\"")]
    InvalidAspectRatio(String),
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("No API key configured for the provider")]
    MissingApiKey,
    #[error("Too many jobs in flight ({active}/{limit}), try again once one finishes")]
    ConcurrencyLimit { active: usize, limit: usize },
    #[error("Frame contains an image with its own prompt node; remove one of the prompts first")]
    NestedPromptConflict,
    #[error("Object not found: {0}")]
    UnknownObject(ObjectId),
    #[error("Canvas not found: {0}")]
    UnknownCanvas(String),
    #[error("Canvas name cannot be empty")]
    EmptyCanvasName,
    #[error("Object already has a prompt node")]
    PromptNodeExists,
    #[error("Prompt nodes can only be attached to images and frames, not {0:?}")]
    InvalidPromptTarget(ObjectRef),
    #[error("Select exactly one image or frame first")]
    SingleSelectionRequired,
    #[error("Favorite slot {0} is out of range")]
    FavoriteSlot(usize),
}

/// Result alias for model operations that can be rejected.
pub type ValidationResult<T> = Result<T, ValidationError>;
