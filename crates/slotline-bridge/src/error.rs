//! Error types for the correlation bridge.
//!
//! Uses `thiserror` for typed errors. Nothing here is fatal to the
//! process: every failure resolves to a structured result for the one
//! request that triggered it.

use slotline_types::CodecError;

/// Errors that can occur while publishing a call or waiting for its reply.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Failed to connect to, publish on, or subscribe to the bus.
    #[error("bus error: {0}")]
    Bus(String),

    /// The call or reply envelope could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// No reply carrying the call's token arrived before the deadline.
    ///
    /// Surfaced to callers as a retryable "worker busy" failure; the
    /// broker itself never retries.
    #[error("timeout: no matching reply before the deadline")]
    ReplyTimeout,

    /// The reply subscription ended while a call was still waiting.
    #[error("reply channel closed while waiting")]
    SubscriptionClosed,
}
