//! HTTP endpoint handlers for the gateway.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/{*path}` | Path-routed player command |
//! | `GET` | `/admin/dump_all` | Dump worker queue state (guarded) |
//! | `GET` | `/admin/inspect_state/{id}/{slot}` | Inspect one slot (guarded) |
//! | `GET` | `/admin/flush` | Drain the reply channel (guarded) |
//!
//! Player commands accept the session id either as the leading path
//! segment or as a `?private_id=` query parameter. All validation is
//! local and synchronous; only well-formed calls reach the broker.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{debug, info};

use slotline_types::{AdminCommand, Channel, PrivateId};

use crate::command;
use crate::error::GatewayError;
use crate::identity;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters accepted on the command path.
#[derive(Debug, serde::Deserialize)]
pub struct CommandQuery {
    /// Session id, when not supplied as the leading path segment.
    pub private_id: Option<String>,
}

/// Query parameters for the admin endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct AdminQuery {
    /// The admin shared secret.
    pub admin_code: Option<String>,
}

// ---------------------------------------------------------------------------
// GET / — minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page naming the instance and the command paths.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let instance = state.broker.instance().to_string();
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Slotline Gateway</title>
    <style>
        body {{ background: #0d1117; color: #c9d1d9; font-family: monospace; padding: 2rem; }}
        h1 {{ color: #58a6ff; }}
        code {{ color: #7ee787; }}
    </style>
</head>
<body>
    <h1>Slotline Gateway</h1>
    <p>Instance <code>{instance}</code></p>
    <p>Commands: <code>/request_slot/&lt;level&gt;</code>,
       <code>/&lt;private_id&gt;/status</code>,
       <code>/&lt;private_id&gt;/move/&lt;distance&gt;</code>,
       <code>/&lt;private_id&gt;/cancel</code>,
       <code>/&lt;private_id&gt;/register_name/public_id/&lt;id&gt;/name/&lt;name&gt;</code></p>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /{*path} — path-routed player command
// ---------------------------------------------------------------------------

/// Resolve a flat command path, enforce the call budget, and service
/// the command through the correlation broker.
pub async fn path_command(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(query): Query<CommandQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, GatewayError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let key = identity::throttle_key(
        segments.first().copied(),
        query.private_id.as_deref(),
        &headers,
    );
    if !state.limiter.check(&key) {
        debug!(key = key, "call budget spent");
        return Err(GatewayError::RateLimited);
    }

    let mut routed = command::route(&segments)?;
    if routed.private_id.is_none() {
        if let Some(raw) = query.private_id.as_deref() {
            routed.private_id = Some(PrivateId::parse(raw)?);
        }
    }

    debug!(
        command = %routed.command,
        has_id = routed.private_id.is_some(),
        args = ?routed.args,
        "routing command"
    );

    let payload = command::build_payload(&routed, &identity::caller_ip(&headers))?;
    let result = state
        .broker
        .call(Channel::Player, routed.command.as_str(), payload)
        .await?;
    Ok(Json(Value::Object(result)))
}

// ---------------------------------------------------------------------------
// Admin endpoints
// ---------------------------------------------------------------------------

/// Refusal for a missing or wrong admin code: an empty 404, revealing
/// nothing about the endpoint.
fn admin_refusal() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

/// Dump the worker's entire queue state.
pub async fn admin_dump_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, GatewayError> {
    if !state.is_admin(query.admin_code.as_deref()) {
        return Ok(admin_refusal());
    }
    info!("admin dump_all requested");
    let result = state
        .broker
        .call(
            Channel::Admin,
            AdminCommand::DumpAll.as_str(),
            serde_json::Map::new(),
        )
        .await?;
    Ok(Json(Value::Object(result)).into_response())
}

/// Inspect the worker-side state of one caller's slot.
pub async fn admin_inspect_state(
    State(state): State<Arc<AppState>>,
    Path((private_id, slot_id)): Path<(String, String)>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, GatewayError> {
    if !state.is_admin(query.admin_code.as_deref()) {
        return Ok(admin_refusal());
    }
    let private_id = PrivateId::parse(&private_id)?;
    info!(slot_id = slot_id, "admin inspect_state requested");

    let mut payload = serde_json::Map::new();
    payload.insert("private_id".to_owned(), Value::from(private_id.as_str()));
    payload.insert("slot_id".to_owned(), Value::from(slot_id));
    let result = state
        .broker
        .call(Channel::Admin, AdminCommand::InspectState.as_str(), payload)
        .await?;
    Ok(Json(Value::Object(result)).into_response())
}

/// Drain this instance's reply channel and report the count.
pub async fn admin_flush(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, GatewayError> {
    if !state.is_admin(query.admin_code.as_deref()) {
        return Ok(admin_refusal());
    }
    let flushed = state.broker.flush_replies().await?;
    info!(flushed = flushed, "reply channel flushed");
    Ok(Json(serde_json::json!({ "flushed": flushed })).into_response())
}
