//! Document question-answering proxy.
//!
//! Accepts a user question together with already-extracted document text,
//! wraps both in a fixed answering prompt and relays the answer produced by
//! the Gemini API. The API key never leaves the server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod prompt;
pub mod services;
pub mod startup;
