//! Provider boundary — the only external dependency of the synthesis pipeline.
//!
//! The pipeline knows nothing about transport, authentication, or rate limits.
//! It hands a [`PromptText`] to a [`GenerativeClient`] and receives raw text or a
//! [`ProviderError`]. `AppState` carries an `Arc<dyn GenerativeClient>`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::synthesis::kind::KindTag;
use crate::synthesis::prompt_builder::PromptText;

/// Failure reported by a text-generation provider (or by the pipeline while
/// waiting on one).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider rate limited the request")]
    RateLimited,

    #[error("provider rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether repeating the identical request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Unavailable(_) | ProviderError::RateLimited | ProviderError::Timeout(_)
        )
    }
}

/// The only error that crosses the pipeline boundary. Carries the kind being
/// generated so callers can retry that kind alone.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} generation failed after {attempts} attempt(s): {source}")]
pub struct GenerationError {
    pub kind: KindTag,
    pub attempts: u32,
    #[source]
    pub source: ProviderError,
}

/// Text-generation capability: prompt in, raw text out.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, prompt: &PromptText) -> Result<String, ProviderError>;
}
