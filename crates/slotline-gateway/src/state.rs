//! Shared application state for the gateway.
//!
//! [`AppState`] holds the correlation broker (one per process, wrapping
//! the process-wide bus connection and instance identity), the rate
//! limiter, and the admin code. Wrapped in [`Arc`](std::sync::Arc) and
//! injected via Axum's `State` extractor.

use slotline_bridge::Broker;

use crate::identity::RateLimiter;

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// The correlation broker every handler calls through.
    pub broker: Broker,
    /// Per-identity call budget enforcement.
    pub limiter: RateLimiter,
    /// Shared secret for the admin endpoints; empty disables admin.
    admin_code: String,
}

impl AppState {
    /// Assemble the state from its parts.
    pub const fn new(broker: Broker, limiter: RateLimiter, admin_code: String) -> Self {
        Self {
            broker,
            limiter,
            admin_code,
        }
    }

    /// Whether `provided` grants admin access.
    ///
    /// An empty configured code means admin is disabled outright, so
    /// nothing is ever accepted.
    pub fn is_admin(&self, provided: Option<&str>) -> bool {
        !self.admin_code.is_empty() && provided == Some(self.admin_code.as_str())
    }
}
