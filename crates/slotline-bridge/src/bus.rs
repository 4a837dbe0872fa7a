//! The bus transport seam.
//!
//! A thin publish/subscribe abstraction over the chosen transport. No
//! retry, no backoff — retry policy belongs entirely to the broker's
//! wait loop. Implementations must provide broadcast fan-out: every
//! subscriber of a channel observes every message published on it.

use async_trait::async_trait;

use crate::error::BridgeError;

/// A publish/subscribe transport the broker can run over.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Publish `payload` on `channel`, fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bus`] if the message cannot be handed to
    /// the transport.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BridgeError>;

    /// Open a subscription on `channel`.
    ///
    /// Each subscription receives its own copy of every subsequent
    /// message on the channel; messages published before the
    /// subscription existed are never delivered.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bus`] if the subscription cannot be opened.
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscription>, BridgeError>;
}

/// One open subscription on a bus channel.
#[async_trait]
pub trait BusSubscription: Send {
    /// Wait for the next message. `None` means the subscription ended.
    async fn next(&mut self) -> Option<Vec<u8>>;

    /// Non-blocking poll: return a message only if one is already
    /// buffered locally.
    fn try_next(&mut self) -> Option<Vec<u8>>;
}
