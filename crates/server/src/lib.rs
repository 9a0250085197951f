//! HTTP boundary for the Smart City Assistant.
//!
//! - `POST /query` `{"text"}` → `{"answer", "sources"}`
//! - `GET /health` → `{"status", "llm_initialized", "chain_initialized"}`
//!
//! Failures render as `{"detail"}` with 400 or 500.

pub mod bootstrap;
pub mod client;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

#[cfg(test)]
mod tests;

pub use bootstrap::{bootstrap, Startup};
pub use client::{AssistantClient, ChatReply};
pub use error::ApiError;
pub use router::router;
pub use server::serve;
pub use state::AppState;
