use crate::error::ChatError;
use crate::prompt::{build_prompt, GenerationParams};
use crate::services::metrics::record_upstream_outcome;
use crate::services::ProviderError;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::Method,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Inbound question about an already-extracted document.
///
/// Fields are optional at the serde level; presence is enforced by `validate`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(required, length(min = 1))]
    pub query: Option<String>,
    /// Full document text, usually tagged with `[Page N]` markers.
    #[validate(required, length(min = 1))]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
}

/// Answer a question about the supplied document text.
#[tracing::instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let provider = state
        .text_provider
        .clone()
        .ok_or(ChatError::ServerMisconfigured)?;

    let (query, context) = validate_payload(payload)?;

    let prompt = build_prompt(&context, &query);
    let params = GenerationParams::default();

    tracing::info!(
        provider = provider.name(),
        query_len = query.len(),
        context_len = context.len(),
        "Forwarding chat request upstream"
    );

    match provider.generate(&prompt, &params).await {
        Ok(text) => {
            record_upstream_outcome(provider.name(), "success");
            tracing::info!(answer_len = text.len(), "Upstream answer received");
            Ok(Json(ChatResponse { text }))
        }
        Err(err) => {
            record_upstream_outcome(provider.name(), outcome_label(&err));
            Err(ChatError::Upstream(err))
        }
    }
}

/// Every verb other than POST on the chat route.
pub async fn method_not_allowed(method: Method) -> ChatError {
    ChatError::MethodNotAllowed(method)
}

fn validate_payload(
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<(String, String), ChatError> {
    let Json(request) =
        payload.map_err(|rejection| ChatError::InvalidRequest(rejection.body_text()))?;

    request
        .validate()
        .map_err(|errors| ChatError::InvalidRequest(errors.to_string()))?;

    match (request.query, request.context) {
        (Some(query), Some(context)) => Ok((query, context)),
        _ => Err(ChatError::InvalidRequest(
            "query or context missing".to_string(),
        )),
    }
}

fn outcome_label(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::ApiError { .. } => "api_error",
        ProviderError::MalformedResponse(_) => "malformed",
        ProviderError::EmptyResponse => "empty",
        ProviderError::NetworkError(_) => "network",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Json<ChatRequest>, JsonRejection> {
        Ok(Json(serde_json::from_str(body).unwrap()))
    }

    #[test]
    fn accepts_both_fields() {
        let (query, context) =
            validate_payload(parse(r#"{"query": "What is X?", "context": "[Page 1] X"}"#)).unwrap();

        assert_eq!(query, "What is X?");
        assert_eq!(context, "[Page 1] X");
    }

    #[test]
    fn rejects_missing_fields() {
        for body in [
            r#"{}"#,
            r#"{"query": "q"}"#,
            r#"{"context": "c"}"#,
            r#"{"query": null, "context": "c"}"#,
        ] {
            let result = validate_payload(parse(body));
            assert!(
                matches!(result, Err(ChatError::InvalidRequest(_))),
                "body {body} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_strings() {
        let result = validate_payload(parse(r#"{"query": "", "context": "c"}"#));
        assert!(matches!(result, Err(ChatError::InvalidRequest(_))));

        let result = validate_payload(parse(r#"{"query": "q", "context": ""}"#));
        assert!(matches!(result, Err(ChatError::InvalidRequest(_))));
    }

    #[test]
    fn whitespace_is_not_empty() {
        let (query, _) = validate_payload(parse(r#"{"query": " ", "context": "c"}"#)).unwrap();
        assert_eq!(query, " ");
    }
}
