//! Gateway entry point.
//!
//! Initializes logging, loads configuration from environment variables,
//! connects to NATS, generates this process's instance identity, and
//! serves HTTP until terminated.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use slotline_bridge::{Broker, NatsBus};
use slotline_gateway::identity::RateLimiter;
use slotline_gateway::{start_server, AppState, GatewayConfig};
use slotline_types::InstanceId;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if initialization or serving fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("slotline-gateway starting");

    let config = GatewayConfig::from_env()?;
    info!(
        nats_url = config.nats_url,
        host = config.host,
        port = config.port,
        calls_per_second = config.calls_per_second,
        reply_timeout_ms = config.reply_timeout.as_millis(),
        admin_enabled = !config.admin_code.is_empty(),
        "configuration loaded"
    );

    let bus = NatsBus::connect(&config.nats_url).await?;

    let instance = InstanceId::generate();
    info!(
        instance = %instance,
        reply_channel = instance.reply_channel(),
        "instance identity generated"
    );

    let broker =
        Broker::new(Arc::new(bus), instance).with_reply_timeout(config.reply_timeout);
    let limiter = RateLimiter::new(config.calls_per_second);
    let state = Arc::new(AppState::new(broker, limiter, config.admin_code.clone()));

    start_server(&config, state).await?;

    Ok(())
}
