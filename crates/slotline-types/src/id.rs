//! Identifier newtypes: the process instance identity and the caller's
//! session identifier ("private id").
//!
//! Both are opaque 32-character tokens. The instance identity is
//! generated here at process start; private ids come from an external
//! allocator and are only validated for shape at the boundary.

use serde::{Deserialize, Serialize};

/// Exact length of an instance identity and of a private id.
pub const ID_LEN: usize = 32;

/// Literal string meaning "absent identifier". Never a valid id.
///
/// Callers that stringify a missing id end up sending this sentinel in
/// the path; it must be rejected before routing, not treated as an id
/// or a command.
pub const NONE_SENTINEL: &str = "None";

/// Errors produced when validating an identifier at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is not exactly [`ID_LEN`] characters long.
    #[error("expected {ID_LEN} characters, got {0}")]
    BadLength(usize),

    /// The [`NONE_SENTINEL`] literal was passed where an id was expected.
    #[error("the sentinel \"{NONE_SENTINEL}\" is not an identifier")]
    Sentinel,
}

/// Process-scoped random identity.
///
/// Generated once at startup and injected explicitly into the broker
/// and bus client constructors; never read from ambient state. The
/// identity names this process's private reply channel, so it must stay
/// immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    /// Generate a fresh instance identity (32 lowercase hex characters).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bus channel this instance subscribes to for its call replies.
    ///
    /// The `client-<instance>` shape is a static contract with the
    /// worker process; changing it breaks reply delivery.
    pub fn reply_channel(&self) -> String {
        format!("client-{}", self.0)
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A caller's opaque session identifier.
///
/// Validated for length only; the allocator guarantees uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateId(String);

impl PrivateId {
    /// Validate a raw string as a private id.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Sentinel`] for the literal `"None"`, and
    /// [`IdError::BadLength`] for any string that is not exactly
    /// [`ID_LEN`] characters.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        if raw == NONE_SENTINEL {
            return Err(IdError::Sentinel);
        }
        if raw.len() != ID_LEN {
            return Err(IdError::BadLength(raw.len()));
        }
        Ok(Self(raw.to_owned()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrivateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
