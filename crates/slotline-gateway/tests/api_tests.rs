//! Integration tests for the gateway HTTP surface.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, with a stub worker answering over the
//! in-process bus.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use slotline_bridge::{Broker, BusTransport, MemoryBus};
use slotline_gateway::identity::RateLimiter;
use slotline_gateway::{build_router, AppState};
use slotline_types::{CallEnvelope, Channel, InstanceId, ReplyEnvelope};

/// Spawn a worker that echoes every call's payload back, tagged with
/// the command name, on both outgoing channels.
async fn spawn_echo_worker(bus: Arc<MemoryBus>) {
    for channel in [Channel::Player, Channel::Admin] {
        let mut inbox = bus.subscribe(channel.as_str()).await.unwrap();
        let bus = Arc::clone(&bus);
        tokio::spawn(async move {
            while let Some(bytes) = inbox.next().await {
                let call = CallEnvelope::decode(&bytes).unwrap();
                let mut result = call.payload.clone();
                result.insert("echo".to_owned(), Value::from(call.command.clone()));
                let reply = ReplyEnvelope {
                    call_time: call.call_time,
                    result,
                };
                let target = format!("client-{}", call.client);
                bus.publish(&target, reply.encode().unwrap()).await.unwrap();
            }
        });
    }
}

async fn make_state(budget: u32, admin_code: &str) -> Arc<AppState> {
    let bus = Arc::new(MemoryBus::new());
    spawn_echo_worker(Arc::clone(&bus)).await;
    let broker = Broker::new(bus, InstanceId::generate());
    Arc::new(AppState::new(
        broker,
        RateLimiter::new(budget),
        admin_code.to_owned(),
    ))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn id32() -> String {
    "a".repeat(32)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn index_returns_html() {
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bare_status_command_round_trips() {
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("echo"), Some(&Value::from("status")));
    assert_eq!(json.get("private_id"), Some(&Value::Null));
    // The correlation token never leaks to the caller.
    assert!(json.get("call_time").is_none());
}

#[tokio::test]
async fn id_prefixed_move_carries_id_and_distance() {
    let router = build_router(make_state(1000, "").await);
    let uri = format!("/{}/move/3.5", id32());
    let response = router
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("echo"), Some(&Value::from("move")));
    assert_eq!(json.get("move_dx"), Some(&Value::from(3.5)));
    assert_eq!(json.get("private_id"), Some(&Value::from(id32())));
}

#[tokio::test]
async fn private_id_query_parameter_is_honored() {
    let router = build_router(make_state(1000, "").await);
    let uri = format!("/cancel?private_id={}", id32());
    let response = router
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("private_id"), Some(&Value::from(id32())));
}

#[tokio::test]
async fn malformed_query_id_is_rejected_before_the_bus() {
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(
            Request::get("/cancel?private_id=short")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn unknown_command_is_404() {
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(Request::get("/teleport/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn none_sentinel_path_is_rejected() {
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(Request::get("/None/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn odd_argument_payload_is_rejected() {
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(
            Request::get("/move/a/b/c").body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn spent_budget_is_429() {
    let router = build_router(make_state(1, "").await);
    let uri = format!("/{}/status", id32());

    // Five back-to-back calls at a budget of one per second touch at
    // most two wall-clock windows, so at least three must be refused.
    let mut statuses = Vec::new();
    for _ in 0..5 {
        let response = router
            .clone()
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        statuses.push(response.status());
    }
    let refused = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert!(refused >= 3, "expected at least 3 refusals, got {statuses:?}");
    assert!(statuses.contains(&StatusCode::OK));
}

#[tokio::test]
async fn silent_worker_surfaces_as_service_unavailable() {
    // No worker on this bus at all.
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let broker =
        Broker::new(bus, InstanceId::generate()).with_reply_timeout(Duration::from_millis(50));
    let state = Arc::new(AppState::new(
        broker,
        RateLimiter::new(1000),
        String::new(),
    ));
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status"), Some(&Value::from(503)));
}

#[tokio::test]
async fn admin_without_code_is_an_empty_refusal() {
    let router = build_router(make_state(1000, "sekrit").await);
    let response = router
        .oneshot(Request::get("/admin/dump_all").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn admin_with_code_reaches_the_admin_channel() {
    let router = build_router(make_state(1000, "sekrit").await);
    let response = router
        .oneshot(
            Request::get("/admin/dump_all?admin_code=sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("echo"), Some(&Value::from("dump_all")));
}

#[tokio::test]
async fn admin_inspect_state_validates_the_id() {
    let router = build_router(make_state(1000, "sekrit").await);
    let uri = format!(
        "/admin/inspect_state/{}/slot-9?admin_code=sekrit",
        id32()
    );
    let response = router
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("echo"), Some(&Value::from("inspect_state")));
    assert_eq!(json.get("slot_id"), Some(&Value::from("slot-9")));

    let bad = build_router(make_state(1000, "sekrit").await)
        .oneshot(
            Request::get("/admin/inspect_state/short/slot-9?admin_code=sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_disabled_rejects_everything() {
    // Empty configured code: even an empty provided code is refused.
    let router = build_router(make_state(1000, "").await);
    let response = router
        .oneshot(
            Request::get("/admin/dump_all?admin_code=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
