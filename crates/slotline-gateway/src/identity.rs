//! Identity derivation and the per-caller call budget.
//!
//! The throttling key is the caller's private id when one is available
//! and plausible, falling back to the network address. This runs before
//! the broker: over-budget callers never generate bus traffic. The
//! limiter itself is a deliberately plain fixed one-second window.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use axum::http::HeaderMap;

use crate::command::looks_like_private_id;

/// Throttle keys kept before stale windows are pruned.
const MAX_TRACKED_KEYS: usize = 10_000;

/// The caller's network address, for identity fallback and the
/// `request_slot` payload.
///
/// Prefers the first `X-Forwarded-For` entry (the gateway normally sits
/// behind a proxy); `"local"` when no forwarding header is present.
pub fn caller_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .unwrap_or_else(|| "local".to_owned())
}

/// Derive the throttling key for a request.
///
/// Precedence: the `private_id` query parameter, then a leading path
/// segment that passes the id-shape predicate, then the caller's
/// network address. There are no 32-character command names, so the
/// shape check is good enough here.
pub fn throttle_key(
    first_segment: Option<&str>,
    query_id: Option<&str>,
    headers: &HeaderMap,
) -> String {
    if let Some(id) = query_id {
        return id.to_owned();
    }
    if let Some(segment) = first_segment {
        if looks_like_private_id(segment) {
            return segment.to_owned();
        }
    }
    caller_ip(headers)
}

/// Fixed-window per-key call counter.
///
/// One window per wall-clock second. Internals are intentionally
/// minimal; the interesting property is only that the check happens
/// before any bus traffic.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_second: u32,
    windows: Mutex<HashMap<String, (u64, u32)>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_per_second` calls per key.
    pub fn new(max_per_second: u32) -> Self {
        Self {
            max_per_second,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one call for `key`; `false` means the budget is spent.
    pub fn check(&self, key: &str) -> bool {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if windows.len() > MAX_TRACKED_KEYS {
            windows.retain(|_, (window, _)| *window == now);
        }

        let entry = windows.entry(key.to_owned()).or_insert((now, 0));
        if entry.0 != now {
            *entry = (now, 0);
        }
        if entry.1 >= self.max_per_second {
            return false;
        }
        entry.1 = entry.1.saturating_add(1);
        true
    }
}
