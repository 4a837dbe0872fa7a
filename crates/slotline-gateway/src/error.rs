//! Error types for the gateway HTTP layer.
//!
//! [`GatewayError`] unifies all failure modes into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Identifier, command, and argument validation fail locally before any
//! bus interaction; only well-formed calls reach the broker, whose sole
//! failure mode surfaces here as [`GatewayError::WorkerBusy`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use slotline_bridge::BridgeError;
use slotline_types::IdError;

/// Errors that can occur while servicing a gateway request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A private id was present but malformed.
    #[error("invalid private id: {0}")]
    InvalidIdentifier(#[from] IdError),

    /// The path did not resolve to a known command.
    #[error("no such command: {0}")]
    UnknownCommand(String),

    /// The positional argument payload was malformed: odd key/value
    /// length, missing required argument, or wrong argument type.
    #[error("malformed arguments: {0}")]
    MalformedArguments(String),

    /// The caller exceeded its per-second call budget.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The worker did not answer before the correlation deadline.
    ///
    /// Retryable from the caller's side; the gateway never retries.
    #[error("worker busy: no reply before deadline")]
    WorkerBusy,

    /// A bus or codec failure below the HTTP layer.
    #[error("bridge error: {0}")]
    Bridge(String),
}

impl From<BridgeError> for GatewayError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::ReplyTimeout => Self::WorkerBusy,
            other => Self::Bridge(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidIdentifier(_) | Self::MalformedArguments(_) => StatusCode::BAD_REQUEST,
            Self::UnknownCommand(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::WorkerBusy => StatusCode::SERVICE_UNAVAILABLE,
            Self::Bridge(_) => StatusCode::BAD_GATEWAY,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
