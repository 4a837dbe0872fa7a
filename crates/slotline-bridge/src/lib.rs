//! Request/response correlation bridge for the Slotline queue gateway.
//!
//! The worker process is reachable only through a fire-and-forget
//! pub/sub bus. This crate turns that into a synchronous,
//! timeout-bounded call/response exchange:
//!
//! ```text
//! gateway handler --> Broker::call --> bus publish (player-in / admin)
//!                                         |
//!                          worker ---- reply on client-<instance>
//!                                         |
//!                     Broker token filter --> result | ReplyTimeout
//! ```
//!
//! The bus transport is a trait seam: [`NatsBus`] for production,
//! [`MemoryBus`] for tests and single-process development runs. Both
//! deliver every published message to **every** subscriber of a channel
//! (broadcast fan-out) — the correlation scheme does not work over
//! work-queue semantics.

pub mod broker;
pub mod bus;
pub mod error;
pub mod memory;
pub mod nats;

// Re-export primary types for convenience.
pub use broker::{Broker, DEFAULT_REPLY_TIMEOUT};
pub use bus::{BusSubscription, BusTransport};
pub use error::BridgeError;
pub use memory::MemoryBus;
pub use nats::NatsBus;
