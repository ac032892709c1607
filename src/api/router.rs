use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::state::AppState;

/// Stateless router exposing only the probes that need no backing
/// store. Used by smoke checks; `/ready` is absent here.
pub fn create_router() -> Router {
    let probes = Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check));

    probes.layer(TraceLayer::new_for_http())
}

/// The full application router: probes, the admin API under `/admin`,
/// and request tracing.
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route("/ready", get(health::ready_check))
        .nest("/admin", admin::create_admin_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
