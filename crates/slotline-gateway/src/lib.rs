//! HTTP gateway for the Slotline queue system.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **A catch-all command path** (`GET /{*path}`) routed by the
//!   path-segment heuristic in [`command`]: an optional 32-character
//!   session id, a command from the closed vocabulary, and positional
//!   arguments
//! - **Admin endpoints** (`/admin/...`) guarded by a configured code
//! - **A minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Every recognized command is serviced by the correlation broker in
//! `slotline-bridge`: the handler validates identity and arguments
//! locally (no bus traffic for bad requests), then blocks on
//! `Broker::call` until the worker's reply or the 3-second ceiling.

pub mod command;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use router::build_router;
pub use server::{start_server, ServerError};
pub use state::AppState;
