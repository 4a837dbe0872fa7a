//! Shared type definitions for the Slotline queue gateway.
//!
//! This crate is pure data: the wire envelope codec, the bus channel
//! names, the closed command vocabulary, and the identifier newtypes
//! shared by the bridge and the HTTP gateway. No I/O happens here.

pub mod channel;
pub mod command;
pub mod envelope;
pub mod id;

// Re-export primary types for convenience.
pub use channel::Channel;
pub use command::{AdminCommand, PlayerCommand};
pub use envelope::{call_token, CallEnvelope, CodecError, ReplyEnvelope};
pub use id::{IdError, InstanceId, PrivateId, ID_LEN, NONE_SENTINEL};
