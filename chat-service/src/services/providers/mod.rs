//! Text generation provider abstraction.
//!
//! The chat handler only sees [`TextProvider`], so the Gemini client can be
//! swapped for a deterministic mock in tests.

pub mod gemini;
pub mod mock;

use crate::prompt::GenerationParams;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Non-success HTTP status from the API. `message` is the API's own
    /// error text when the body carried one.
    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    ApiError {
        status: u16,
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response contained no candidate text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a single answer for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;

    /// Short identifier used in logs and metrics.
    fn name(&self) -> &str;
}
