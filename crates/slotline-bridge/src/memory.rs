//! In-process bus over [`tokio::sync::broadcast`] channels.
//!
//! Mirrors the delivery semantics the broker needs from NATS: every
//! subscriber of a channel receives its own copy of every message
//! published after it subscribed, and a publish with no subscribers is
//! dropped. Backs the broker and gateway tests, and single-process
//! development runs where no NATS server is available.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::bus::{BusSubscription, BusTransport};
use crate::error::BridgeError;

/// Buffered messages per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

/// In-process broadcast bus.
#[derive(Debug, Default)]
pub struct MemoryBus {
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl MemoryBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl BusTransport for MemoryBus {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
        let sender = {
            let channels = self
                .channels
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            channels.get(channel).cloned()
        };
        match sender {
            // send only fails when there are zero receivers; pub/sub
            // drops such messages rather than erroring.
            Some(tx) => {
                if tx.send(payload).is_err() {
                    debug!(channel = channel, "no subscribers; message dropped");
                }
            }
            None => debug!(channel = channel, "no subscribers; message dropped"),
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscription>, BridgeError> {
        let rx = self.sender_for(channel).subscribe();
        Ok(Box::new(MemorySubscription {
            channel: channel.to_owned(),
            rx,
        }))
    }
}

/// One open in-process subscription.
struct MemorySubscription {
    channel: String,
    rx: broadcast::Receiver<Vec<u8>>,
}

#[async_trait]
impl BusSubscription for MemorySubscription {
    async fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        channel = self.channel,
                        skipped = skipped,
                        "subscriber lagged; messages dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn try_next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(
                        channel = self.channel,
                        skipped = skipped,
                        "subscriber lagged; messages dropped"
                    );
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_every_message() {
        let bus = MemoryBus::new();
        let mut a = bus.subscribe("fanout").await.ok();
        let mut b = bus.subscribe("fanout").await.ok();
        let published = bus.publish("fanout", b"one".to_vec()).await;
        assert!(published.is_ok());
        let got_a = a.as_mut().and_then(|s| s.try_next());
        let got_b = b.as_mut().and_then(|s| s.try_next());
        assert_eq!(got_a, Some(b"one".to_vec()));
        assert_eq!(got_b, Some(b"one".to_vec()));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped_not_an_error() {
        let bus = MemoryBus::new();
        let published = bus.publish("nobody-listens", b"gone".to_vec()).await;
        assert!(published.is_ok());
        // A later subscriber must not see the earlier message.
        let mut sub = bus.subscribe("nobody-listens").await.ok();
        assert_eq!(sub.as_mut().and_then(|s| s.try_next()), None);
    }

    #[tokio::test]
    async fn try_next_is_non_blocking() {
        let bus = MemoryBus::new();
        let mut sub = bus.subscribe("quiet").await.ok();
        assert_eq!(sub.as_mut().and_then(|s| s.try_next()), None);
    }
}
