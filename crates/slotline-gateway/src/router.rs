//! Axum router construction for the gateway.
//!
//! Assembles the status page, the guarded admin endpoints, and the
//! catch-all command path into a single [`Router`] with CORS and
//! request tracing. The admin routes are registered before the
//! wildcard, so `/admin/...` never reaches the command router.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the gateway.
///
/// CORS allows any origin: callers are browser games on other domains
/// (the original motivation for the flat GET command paths).
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Admin (guarded by admin_code)
        .route("/admin/dump_all", get(handlers::admin_dump_all))
        .route(
            "/admin/inspect_state/{private_id}/{slot_id}",
            get(handlers::admin_inspect_state),
        )
        .route("/admin/flush", get(handlers::admin_flush))
        // Everything else is a command path
        .route("/{*path}", get(handlers::path_command))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
