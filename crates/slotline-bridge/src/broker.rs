//! The request correlation broker.
//!
//! The bus offers no request/response primitive and no ordering across
//! concurrent callers sharing one process's reply channel. The broker
//! builds a call envelope with a fresh token, publishes it, and waits
//! on its own subscription to the instance reply channel until a reply
//! echoing that token arrives or the deadline elapses. The token check
//! is the only integrity guard against cross-talk between overlapping
//! calls from the same process.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use slotline_types::{CallEnvelope, Channel, InstanceId, ReplyEnvelope};

use crate::bus::BusTransport;
use crate::error::BridgeError;

/// How long a call waits for its reply before giving up.
///
/// Fixed ceiling inherited from the worker contract; injectable per
/// broker for tests, but production brokers use this default.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Interval for the non-blocking drain in [`Broker::flush_replies`].
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Empty polls tolerated before [`Broker::flush_replies`] stops draining.
const FLUSH_IDLE_POLLS: u32 = 10;

/// Orchestrates one synchronous call over the asynchronous bus.
///
/// Holds the process-wide bus connection and the immutable instance
/// identity. Cheap to share: every concurrent request calls into the
/// same broker, and each call opens its own reply subscription.
pub struct Broker {
    bus: Arc<dyn BusTransport>,
    instance: InstanceId,
    reply_timeout: Duration,
}

impl Broker {
    /// Create a broker over `bus` for this process's `instance`, with
    /// the default reply ceiling.
    pub fn new(bus: Arc<dyn BusTransport>, instance: InstanceId) -> Self {
        Self {
            bus,
            instance,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Override the reply ceiling. Exists for tests; production code
    /// keeps [`DEFAULT_REPLY_TIMEOUT`].
    #[must_use]
    pub const fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// The instance identity this broker answers on.
    pub const fn instance(&self) -> &InstanceId {
        &self.instance
    }

    /// Publish `command` with `payload` on `channel` and wait for the
    /// matching reply.
    ///
    /// The reply subscription is opened before publishing so the reply
    /// cannot race it. Replies carrying a different token are routine
    /// cross-talk from other in-flight calls on this instance: they are
    /// logged and discarded, and the deadline is **not** reset.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ReplyTimeout`] if no matching reply
    /// arrives within the ceiling, [`BridgeError::SubscriptionClosed`]
    /// if the reply channel ends mid-wait, or a bus/codec error from
    /// the publish itself.
    pub async fn call(
        &self,
        channel: Channel,
        command: &str,
        payload: Map<String, Value>,
    ) -> Result<Map<String, Value>, BridgeError> {
        let reply_channel = self.instance.reply_channel();
        let mut subscription = self.bus.subscribe(&reply_channel).await?;

        let envelope = CallEnvelope::new(command, payload, &self.instance);
        let token = envelope.call_time;
        let bytes = envelope.encode()?;
        debug!(
            channel = channel.as_str(),
            command = command,
            call_time = token,
            "publishing call envelope"
        );
        self.bus.publish(channel.as_str(), bytes).await?;

        // Absolute deadline: stale traffic cannot extend the wait.
        let deadline = Instant::now() + self.reply_timeout;
        loop {
            let message = match tokio::time::timeout_at(deadline, subscription.next()).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    error!(
                        command = command,
                        call_time = token,
                        "reply subscription closed mid-call"
                    );
                    return Err(BridgeError::SubscriptionClosed);
                }
                Err(_) => {
                    error!(
                        command = command,
                        call_time = token,
                        timeout_ms = self.reply_timeout.as_millis(),
                        "no matching reply before deadline"
                    );
                    return Err(BridgeError::ReplyTimeout);
                }
            };

            let reply = match ReplyEnvelope::decode(&message) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(
                        error = %e,
                        "undecodable message on reply channel; discarding"
                    );
                    continue;
                }
            };

            if reply.answers(token) {
                debug!(
                    command = command,
                    call_time = token,
                    "matching reply received"
                );
                return Ok(reply.result);
            }

            // Routine cross-talk: a reply meant for another in-flight
            // call on this instance, or a redelivered duplicate.
            warn!(
                call_time = token,
                reply_time = reply.call_time,
                "stale reply on reply channel; continuing to wait"
            );
        }
    }

    /// Drain whatever arrives on the reply channel for a short window
    /// and report how many messages were discarded.
    ///
    /// Admin maintenance operation: stops after [`FLUSH_IDLE_POLLS`]
    /// consecutive empty polls spaced [`FLUSH_POLL_INTERVAL`] apart.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bus`] if the subscription cannot be opened.
    pub async fn flush_replies(&self) -> Result<usize, BridgeError> {
        let mut subscription = self.bus.subscribe(&self.instance.reply_channel()).await?;
        let mut flushed = 0usize;
        let mut idle = FLUSH_IDLE_POLLS;
        while idle > 0 {
            match subscription.try_next() {
                Some(_) => flushed = flushed.saturating_add(1),
                None => idle = idle.saturating_sub(1),
            }
            tokio::time::sleep(FLUSH_POLL_INTERVAL).await;
        }
        debug!(flushed = flushed, "reply channel drained");
        Ok(flushed)
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("instance", &self.instance)
            .field("reply_timeout", &self.reply_timeout)
            .finish_non_exhaustive()
    }
}
