//! Gemini AI provider implementation.
//!
//! Sends one non-streaming `generateContent` call per answer.

use super::{ProviderError, TextProvider};
use crate::config::GeminiSettings;
use crate::prompt::GenerationParams;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    /// Provider config from service settings, or `None` when no key is set.
    pub fn from_settings(settings: &GeminiSettings) -> Option<Self> {
        settings.api_key.clone().map(|api_key| Self {
            api_key,
            model: settings.model.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            timeout: settings.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            config,
            client: builder.build()?,
        })
    }

    /// Build the API URL for the given model and method.
    ///
    /// The key travels as a query parameter; the returned string is secret.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.api_base,
            self.config.model,
            method,
            self.config.api_key.expose_secret()
        )
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let request = GenerateContentRequest::new(prompt, params);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        // `without_url` keeps the key-bearing URL out of error messages.
        let response = self
            .client
            .post(self.api_url("generateContent"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        extract_answer(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Map an error body like `{"error": {"code": 400, "message": "..."}}`.
/// Bodies that are not JSON, or carry no message, keep only the status.
fn api_error(status: u16, body: &[u8]) -> ProviderError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.is_empty());

    ProviderError::ApiError { status, message }
}

/// Text of the first part of the first candidate.
fn extract_answer(body: &[u8]) -> Result<String, ProviderError> {
    let api_response: GenerateContentResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    api_response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(ProviderError::EmptyResponse)
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, params: &GenerationParams) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                max_output_tokens: params.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_matches_generate_content_shape() {
        let params = GenerationParams::default();
        let body = serde_json::to_value(GenerateContentRequest::new("prompt text", &params)).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{ "parts": [{ "text": "prompt text" }] }],
                "generationConfig": {
                    "temperature": 0.3,
                    "topP": 0.9,
                    "maxOutputTokens": 500
                }
            })
        );
    }

    #[test]
    fn extracts_first_candidate_first_part() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "first" }, { "text": "second" }] } },
                { "content": { "parts": [{ "text": "other candidate" }] } }
            ]
        });

        let answer = extract_answer(body.to_string().as_bytes()).unwrap();
        assert_eq!(answer, "first");
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let result = extract_answer(br#"{"candidates": []}"#);
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));

        let result = extract_answer(br#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn candidate_without_text_is_an_error() {
        let result = extract_answer(br#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));

        let result = extract_answer(br#"{"candidates": [{"content": {"parts": []}}]}"#);
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn non_json_success_body_is_malformed() {
        let result = extract_answer(b"<html>oops</html>");
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn api_error_reads_upstream_message() {
        let body = br#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;

        match api_error(400, body) {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("API key not valid."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_without_json_keeps_status_only() {
        match api_error(503, b"Service Unavailable") {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 503);
                assert!(message.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_settings_requires_key() {
        let mut settings = GeminiSettings::default();
        assert!(GeminiConfig::from_settings(&settings).is_none());

        settings.api_key = Some(Secret::new("k".to_string()));
        settings.api_base = "http://127.0.0.1:9999/v1beta/".to_string();
        let config = GeminiConfig::from_settings(&settings).unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9999/v1beta");
        assert_eq!(config.model, "gemini-2.0-flash");
    }
}
