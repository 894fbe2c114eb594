//! Provider capability interface.
//!
//! Implementations perform the actual network calls. The engine only
//! relies on this contract and on the error classification below.

use canvasforge_core::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which provider a job targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Image plus prompt to one or more result images.
    Edit,
    /// Prompt only to one image.
    Generate,
}

/// Provider failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Non-2xx HTTP response.
    #[error("Provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// The request never got a response.
    #[error("Could not reach provider: {0}")]
    Transport(String),
    /// The provider reported an explicit failure.
    #[error("Provider failed: {0}")]
    Failed(String),
    /// A response is missing an expected field.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Whether a poll that failed this way should simply be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Http { .. } | ProviderError::Transport(_))
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Status of a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Pending,
    Completed,
    Failed,
}

/// One poll response as reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub status: PollStatus,
    /// Result image URLs. Required when completed.
    #[serde(default, alias = "output_url", deserialize_with = "one_or_many")]
    pub output_urls: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PollResponse {
    pub fn pending() -> Self {
        Self {
            status: PollStatus::Pending,
            output_urls: Vec::new(),
            error: None,
        }
    }

    pub fn completed(output_urls: Vec<String>) -> Self {
        Self {
            status: PollStatus::Completed,
            output_urls,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: PollStatus::Failed,
            output_urls: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Parse a JSON poll body.
    pub fn from_json(body: &str) -> ProviderResult<Self> {
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// Edit submission.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// Public URL of the uploaded capture.
    pub image_url: String,
    pub prompt: String,
    /// Pixel size of the capture.
    pub target_size: (u32, u32),
}

/// External image provider.
///
/// Futures may borrow the provider but not the arguments, so
/// implementations copy what they need before the first await.
pub trait Provider {
    /// Upload encoded image bytes and return a public URL.
    fn upload_binary(&self, png: Vec<u8>) -> BoxFuture<'_, ProviderResult<String>>;

    /// Submit an edit and return the provider's request id.
    fn submit_edit(&self, request: EditRequest) -> BoxFuture<'_, ProviderResult<String>>;

    /// Submit a generation and return the provider's request id.
    fn submit_generate(&self, prompt: &str) -> BoxFuture<'_, ProviderResult<String>>;

    /// Poll a submitted request.
    fn poll_result(&self, request_id: &str) -> BoxFuture<'_, ProviderResult<PollResponse>>;

    /// Fetch the encoded bytes of a result image.
    fn download(&self, url: &str) -> BoxFuture<'_, ProviderResult<Vec<u8>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poll_bodies() {
        let r = PollResponse::from_json(r#"{ "status": "pending" }"#).unwrap();
        assert_eq!(r, PollResponse::pending());

        let r = PollResponse::from_json(r#"{ "status": "completed", "output_url": "https://x/1.png" }"#).unwrap();
        assert_eq!(r.output_urls, vec!["https://x/1.png".to_string()]);

        let r = PollResponse::from_json(r#"{ "status": "completed", "output_urls": ["a", "b"] }"#).unwrap();
        assert_eq!(r.output_urls.len(), 2);

        let r = PollResponse::from_json(r#"{ "status": "failed", "error": "nsfw", "output_url": null }"#).unwrap();
        assert_eq!(r, PollResponse::failed("nsfw"));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(PollResponse::from_json("{}"), Err(ProviderError::Malformed(_))));
        assert!(matches!(
            PollResponse::from_json(r#"{ "status": "exploded" }"#),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Http { status: 502, message: "bad gateway".into() }.is_transient());
        assert!(ProviderError::Transport("reset".into()).is_transient());
        assert!(!ProviderError::Failed("no".into()).is_transient());
        assert!(!ProviderError::Malformed("missing id".into()).is_transient());
    }
}
