//! Failure taxonomy of the chat endpoint and its HTTP mapping.
//!
//! Callers only ever see the short messages below. Everything else (the
//! underlying cause, upstream status, network detail) goes to the log.

use crate::services::ProviderError;
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const MISCONFIGURED_MESSAGE: &str = "API key is not configured on the server.";
pub const INVALID_REQUEST_MESSAGE: &str = "Request is missing `query` or `context`.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("Upstream API key is not configured")]
    ServerMisconfigured,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream failure: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::ServerMisconfigured | ChatError::Upstream(_) | ChatError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the `error` field of the response body.
    pub fn public_message(&self) -> String {
        match self {
            ChatError::MethodNotAllowed(method) => format!("Method {} Not Allowed", method),
            ChatError::ServerMisconfigured => MISCONFIGURED_MESSAGE.to_string(),
            ChatError::InvalidRequest(_) => INVALID_REQUEST_MESSAGE.to_string(),
            ChatError::Upstream(ProviderError::ApiError { status, message }) => message
                .clone()
                .unwrap_or_else(|| format!("Google API error: {}", status)),
            ChatError::Upstream(ProviderError::EmptyResponse) => {
                "Google API returned no answer.".to_string()
            }
            ChatError::Upstream(ProviderError::MalformedResponse(_)) => {
                "Google API returned an unreadable response.".to_string()
            }
            ChatError::Upstream(ProviderError::NetworkError(_)) | ChatError::Internal(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match &self {
            ChatError::MethodNotAllowed(method) => {
                tracing::warn!(method = %method, "Rejected chat request with unsupported method");
            }
            ChatError::ServerMisconfigured => {
                tracing::error!("GEMINI_API_KEY is not set; refusing chat request");
            }
            ChatError::InvalidRequest(detail) => {
                tracing::warn!(detail = %detail, "Rejected invalid chat request");
            }
            ChatError::Upstream(err) => {
                tracing::error!(error = %err, "Upstream generation failed");
            }
            ChatError::Internal(err) => {
                tracing::error!(error = ?err, "Chat request failed");
            }
        }

        let status = self.status();
        let message = self.public_message();

        if let ChatError::MethodNotAllowed(_) = self {
            return (
                status,
                [(header::ALLOW, HeaderValue::from_static("POST"))],
                message,
            )
                .into_response();
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
