//! report-server: HTTP API server for the report editor
//!
//! This crate provides:
//! - REST endpoints over the tiered report store and the document model
//! - Server-Sent Events (SSE) for realtime report updates
//! - Sample report initialization
//!
//! # Architecture
//!
//! The server is built on Axum with a middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! Mutations on read-only reports are accepted and answered with
//! `{"applied": false}`; they never reach the store.

pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use events::EventBroadcaster;
pub use state::AppState;

// Re-export dependent crates
pub use report_core;
pub use report_store;
pub use report_sync;
