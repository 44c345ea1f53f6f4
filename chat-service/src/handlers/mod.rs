//! HTTP handlers for the chat service.

pub mod chat;
pub mod health;
pub mod metrics;

pub use chat::{chat, method_not_allowed, ChatRequest, ChatResponse};
pub use health::health_check;
pub use metrics::metrics;
