//! Mock provider implementation for testing.

use super::{ProviderError, TextProvider};
use crate::prompt::GenerationParams;
use async_trait::async_trait;
use std::sync::Mutex;

/// Canned outcome returned by [`MockTextProvider`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Answer(String),
    ApiError { status: u16, message: Option<String> },
    Empty,
    Network,
}

/// Mock text provider for testing.
///
/// Always returns the same reply and remembers every prompt it was given.
pub struct MockTextProvider {
    reply: MockReply,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(text: impl Into<String>) -> Self {
        Self::new(MockReply::Answer(text.into()))
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.reply {
            MockReply::Answer(text) => Ok(text.clone()),
            MockReply::ApiError { status, message } => Err(ProviderError::ApiError {
                status: *status,
                message: message.clone(),
            }),
            MockReply::Empty => Err(ProviderError::EmptyResponse),
            MockReply::Network => Err(ProviderError::NetworkError(
                "connection refused".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
