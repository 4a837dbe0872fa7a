//! NATS implementation of the bus transport.
//!
//! NATS core pub/sub delivers each message to every subscriber of a
//! subject (no queue groups are used anywhere in this crate), which is
//! the fan-out behavior the correlation scheme depends on: concurrent
//! calls sharing one instance's reply channel each hold their own
//! subscription and each see every reply.

use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info};

use crate::bus::{BusSubscription, BusTransport};
use crate::error::BridgeError;

/// NATS-backed bus client.
///
/// Holds a single connection, opened once at startup and shared by
/// every concurrent call.
#[derive(Clone)]
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bus`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<Self, BridgeError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BridgeError::Bus(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }
}

#[async_trait]
impl BusTransport for NatsBus {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
        debug!(channel = channel, bytes = payload.len(), "publishing");
        self.client
            .publish(channel.to_owned(), payload.into())
            .await
            .map_err(|e| BridgeError::Bus(format!("failed to publish to {channel}: {e}")))?;
        // Flush so the call is on the wire before the wait loop starts.
        self.client
            .flush()
            .await
            .map_err(|e| BridgeError::Bus(format!("flush failed: {e}")))?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscription>, BridgeError> {
        debug!(channel = channel, "subscribing");
        let subscriber = self
            .client
            .subscribe(channel.to_owned())
            .await
            .map_err(|e| BridgeError::Bus(format!("failed to subscribe to {channel}: {e}")))?;
        Ok(Box::new(NatsSubscription { inner: subscriber }))
    }
}

impl std::fmt::Debug for NatsBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsBus").field("connected", &true).finish()
    }
}

/// One open NATS subscription.
struct NatsSubscription {
    inner: async_nats::Subscriber,
}

#[async_trait]
impl BusSubscription for NatsSubscription {
    async fn next(&mut self) -> Option<Vec<u8>> {
        self.inner.next().await.map(|m| m.payload.to_vec())
    }

    fn try_next(&mut self) -> Option<Vec<u8>> {
        self.inner
            .next()
            .now_or_never()
            .flatten()
            .map(|m| m.payload.to_vec())
    }
}
