//! Configuration for the gateway.
//!
//! All configuration is loaded from environment variables. The gateway
//! needs to know how to reach NATS, where to listen, the admin code,
//! and two tuning knobs (per-caller call budget and reply ceiling).

use std::time::Duration;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse.
    #[error("config error: {0}")]
    Invalid(String),
}

/// Complete gateway configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// NATS server URL (e.g. `nats://localhost:4222`).
    pub nats_url: String,
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
    /// Shared secret for the admin endpoints. Empty disables admin.
    pub admin_code: String,
    /// Per-identity call budget per second.
    pub calls_per_second: u32,
    /// How long a call waits for the worker's reply.
    pub reply_timeout: Duration,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables (with defaults):
    /// - `NATS_URL` — NATS connection string (`nats://localhost:4222`)
    /// - `GATEWAY_HOST` — bind address (`0.0.0.0`)
    /// - `GATEWAY_PORT` — TCP port (`8080`)
    /// - `ADMIN_CODE` — admin shared secret (empty, admin disabled)
    /// - `CALLS_PER_SECOND` — per-identity budget (`3`)
    /// - `REPLY_TIMEOUT_MS` — worker reply ceiling in ms (`3000`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_owned());
        let host = std::env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());

        let port: u16 = std::env::var("GATEWAY_PORT")
            .unwrap_or_else(|_| "8080".to_owned())
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid GATEWAY_PORT: {e}")))?;

        let admin_code = std::env::var("ADMIN_CODE").unwrap_or_default();

        let calls_per_second: u32 = std::env::var("CALLS_PER_SECOND")
            .unwrap_or_else(|_| "3".to_owned())
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid CALLS_PER_SECOND: {e}")))?;

        let reply_timeout_ms: u64 = std::env::var("REPLY_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_owned())
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid REPLY_TIMEOUT_MS: {e}")))?;

        Ok(Self {
            nats_url,
            host,
            port,
            admin_code,
            calls_per_second,
            reply_timeout: Duration::from_millis(reply_timeout_ms),
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_owned(),
            host: "0.0.0.0".to_owned(),
            port: 8080,
            admin_code: String::new(),
            calls_per_second: 3,
            reply_timeout: Duration::from_millis(3000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_worker_contract() {
        let config = GatewayConfig::default();
        assert_eq!(config.reply_timeout, Duration::from_secs(3));
        assert_eq!(config.calls_per_second, 3);
        assert!(config.admin_code.is_empty());
    }
}
