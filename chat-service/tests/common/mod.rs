#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use chat_service::config::{ChatConfig, GeminiSettings};
use chat_service::services::TextProvider;
use chat_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TEST_API_KEY: &str = "test-api-key";

/// Request as seen by the stub Gemini API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Local stand-in for the Gemini REST API that replies with a fixed
/// status and body and records every request.
pub struct StubGemini {
    pub api_base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubGemini {
    pub async fn spawn(status: StatusCode, body: impl Into<String>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status,
            body: body.into(),
            requests: requests.clone(),
        };

        let app = Router::new().fallback(stub_handler).with_state(state);
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            api_base: format!("http://{}/v1beta", addr),
            requests,
        }
    }

    /// Stub that answers every call with a single candidate.
    pub async fn answering(text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 12 }
        });
        Self::spawn(StatusCode::OK, body.to_string()).await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn stub_handler(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}

/// Configuration for an app on a random port talking to `api_base`.
pub fn test_config(api_base: &str, api_key: Option<&str>) -> ChatConfig {
    ChatConfig {
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
            otlp_endpoint: None,
        },
        gemini: GeminiSettings {
            api_key: api_key.map(|key| Secret::new(key.to_string())),
            api_base: api_base.to_string(),
            ..GeminiSettings::default()
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the full application using the Gemini provider built from `config`.
    pub async fn spawn(config: ChatConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        Self::start(app)
    }

    /// Spawn the application around an explicit provider.
    pub async fn spawn_with_provider(provider: Option<Arc<dyn TextProvider>>) -> Self {
        let config = test_config("http://127.0.0.1:1/v1beta", None);
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build application");
        Self::start(app)
    }

    fn start(app: Application) -> Self {
        let address = format!("http://127.0.0.1:{}", app.port());
        tokio::spawn(app.run_until_stopped());

        Self {
            address,
            client: reqwest::Client::new(),
        }
    }

    pub async fn post_chat(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/chat", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
