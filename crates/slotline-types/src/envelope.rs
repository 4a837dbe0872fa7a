//! Wire envelope codec.
//!
//! A call envelope serializes to a flat JSON object with a single
//! command key mapping to the command payload, plus `call_time` (the
//! correlation token) and `client` (the sender's instance identity)
//! merged into the same top-level record:
//!
//! ```json
//! {"request_slot": {"private_id": null, "level": 2}, "call_time": 1724700000.417, "client": "6f…"}
//! ```
//!
//! A reply envelope echoes `call_time` alongside arbitrary result
//! fields. Pure serialization; no I/O, no retry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::InstanceId;

/// Errors produced by the envelope codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Underlying JSON serialization or deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded value is not a JSON object.
    #[error("envelope is not a JSON object")]
    NotAnObject,

    /// A required top-level field is missing or mistyped.
    #[error("envelope is missing the `{0}` field")]
    MissingField(&'static str),

    /// No command key remained after the metadata fields.
    #[error("envelope carries no command key")]
    MissingCommand,

    /// More than one command key remained after the metadata fields.
    #[error("envelope carries more than one command key")]
    AmbiguousCommand,

    /// The command payload is not a JSON object.
    #[error("payload for command `{0}` is not an object")]
    BadPayload(String),

    /// The call token is NaN or infinite and cannot be a JSON number.
    #[error("call token is not a finite number")]
    NonFiniteToken,
}

/// Current wall-clock time in seconds as the per-call correlation token.
///
/// Sub-second precision is what distinguishes concurrent calls issued
/// within the same second. Uniqueness is probabilistic; sub-microsecond
/// collisions are treated as negligible. The token orders nothing — it
/// is only ever compared for equality.
pub fn call_token() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One outgoing call: command, payload, correlation token, sender.
///
/// Created per request and discarded as soon as the exchange resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
    /// Command name (one of the closed vocabulary).
    pub command: String,
    /// Command-specific named fields.
    pub payload: Map<String, Value>,
    /// Correlation token: wall-clock seconds at construction time.
    pub call_time: f64,
    /// Instance identity of the sending process.
    pub client: String,
}

impl CallEnvelope {
    /// Build an envelope for `command`, stamping a fresh call token and
    /// the sender's instance identity.
    pub fn new(command: &str, payload: Map<String, Value>, client: &InstanceId) -> Self {
        Self {
            command: command.to_owned(),
            payload,
            call_time: call_token(),
            client: client.as_str().to_owned(),
        }
    }

    /// Serialize to the wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NonFiniteToken`] if the token cannot be
    /// represented as a JSON number.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let token = serde_json::Number::from_f64(self.call_time)
            .ok_or(CodecError::NonFiniteToken)?;
        let mut root = Map::new();
        root.insert(self.command.clone(), Value::Object(self.payload.clone()));
        root.insert("call_time".to_owned(), Value::Number(token));
        root.insert("client".to_owned(), Value::String(self.client.clone()));
        Ok(serde_json::to_vec(&Value::Object(root))?)
    }

    /// Deserialize from the wire shape.
    ///
    /// After stripping `call_time` and `client`, exactly one key must
    /// remain; it is the command.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] describing the malformation.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let Value::Object(mut root) = serde_json::from_slice(bytes)? else {
            return Err(CodecError::NotAnObject);
        };
        let call_time = root
            .remove("call_time")
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or(CodecError::MissingField("call_time"))?;
        let client = match root.remove("client") {
            Some(Value::String(s)) => s,
            _ => return Err(CodecError::MissingField("client")),
        };
        let mut remaining = root.into_iter();
        let (command, payload_value) =
            remaining.next().ok_or(CodecError::MissingCommand)?;
        if remaining.next().is_some() {
            return Err(CodecError::AmbiguousCommand);
        }
        let Value::Object(payload) = payload_value else {
            return Err(CodecError::BadPayload(command));
        };
        Ok(Self {
            command,
            payload,
            call_time,
            client,
        })
    }
}

/// One reply from the worker: the echoed token plus result fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    /// The call token being answered; must echo the caller's value.
    pub call_time: f64,
    /// Arbitrary result fields, returned to the caller once matched.
    #[serde(flatten)]
    pub result: Map<String, Value>,
}

impl ReplyEnvelope {
    /// Serialize to the wire shape.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from the wire shape.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Whether this reply answers the given call token.
    ///
    /// The worker echoes the token verbatim and `serde_json` round-trips
    /// `f64` exactly, so bitwise equality is the correct match; an
    /// epsilon would invite cross-talk between near-simultaneous calls.
    pub fn answers(&self, token: f64) -> bool {
        self.call_time.to_bits() == token.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_of(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn call_envelope_round_trips() {
        let client = InstanceId::generate();
        let payload = payload_of(&[
            ("private_id", Value::Null),
            ("level", Value::from(2)),
        ]);
        let envelope = CallEnvelope::new("request_slot", payload, &client);
        let bytes = envelope.encode().unwrap_or_default();
        let decoded = CallEnvelope::decode(&bytes);
        assert_eq!(decoded.ok(), Some(envelope));
    }

    #[test]
    fn token_precision_survives_the_wire() {
        // Two tokens taken back-to-back in the same second must stay
        // distinguishable after a JSON round trip.
        let client = InstanceId::generate();
        let a = CallEnvelope::new("status", Map::new(), &client);
        let mut b = CallEnvelope::new("status", Map::new(), &client);
        if b.call_time.to_bits() == a.call_time.to_bits() {
            // Same clock reading; nudge by one ulp to model the next call.
            b.call_time = f64::from_bits(a.call_time.to_bits().wrapping_add(1));
        }
        let bytes_a = a.encode().unwrap_or_default();
        let bytes_b = b.encode().unwrap_or_default();
        let back_a = CallEnvelope::decode(&bytes_a).ok().map(|e| e.call_time);
        let back_b = CallEnvelope::decode(&bytes_b).ok().map(|e| e.call_time);
        assert_eq!(back_a.map(f64::to_bits), Some(a.call_time.to_bits()));
        assert_eq!(back_b.map(f64::to_bits), Some(b.call_time.to_bits()));
        assert_ne!(back_a.map(f64::to_bits), back_b.map(f64::to_bits));
    }

    #[test]
    fn decode_rejects_two_command_keys() {
        let raw = br#"{"status": {}, "move": {}, "call_time": 1.5, "client": "x"}"#;
        assert!(matches!(
            CallEnvelope::decode(raw),
            Err(CodecError::AmbiguousCommand)
        ));
    }

    #[test]
    fn decode_rejects_missing_metadata() {
        let raw = br#"{"status": {}}"#;
        assert!(matches!(
            CallEnvelope::decode(raw),
            Err(CodecError::MissingField("call_time"))
        ));
    }

    #[test]
    fn decode_rejects_non_object_payload() {
        let raw = br#"{"status": 7, "call_time": 1.5, "client": "x"}"#;
        assert!(matches!(
            CallEnvelope::decode(raw),
            Err(CodecError::BadPayload(cmd)) if cmd == "status"
        ));
    }

    #[test]
    fn reply_round_trips_and_matches() {
        let reply = ReplyEnvelope {
            call_time: 1_724_700_000.417_332,
            result: payload_of(&[("position", Value::from(3.5))]),
        };
        let bytes = reply.encode().unwrap_or_default();
        let decoded = ReplyEnvelope::decode(&bytes).ok();
        assert_eq!(decoded.as_ref(), Some(&reply));
        assert!(reply.answers(1_724_700_000.417_332));
        assert!(!reply.answers(1_724_700_000.417_333));
    }

    #[test]
    fn non_finite_token_is_a_codec_error() {
        let client = InstanceId::generate();
        let mut envelope = CallEnvelope::new("status", Map::new(), &client);
        envelope.call_time = f64::NAN;
        assert!(matches!(
            envelope.encode(),
            Err(CodecError::NonFiniteToken)
        ));
    }
}
