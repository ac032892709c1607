//! Admin API endpoints for managing keys and auxiliary resources

pub mod api_keys;
pub mod apps;
pub mod rues;
pub mod shared_secrets;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // API key management
        .route("/api-keys", get(api_keys::list_api_keys))
        .route("/api-keys", post(api_keys::create_api_key))
        .route("/api-keys/stats", get(api_keys::key_stats))
        .route("/api-keys/validate", post(api_keys::validate_api_key))
        .route("/api-keys/{key_id}", get(api_keys::get_api_key))
        .route("/api-keys/{key_id}", delete(api_keys::delete_api_key))
        .route("/api-keys/{key_id}/revoke", post(api_keys::revoke_api_key))
        .route(
            "/api-keys/{key_id}/metadata",
            put(api_keys::update_api_key_metadata),
        )
        .route(
            "/api-keys/{key_id}/scopes",
            put(api_keys::update_api_key_scopes),
        )
        .route("/api-keys/{key_id}/name", put(api_keys::rename_api_key))
        // Application registry
        .route("/apps", get(apps::list_apps))
        .route("/apps", post(apps::create_app))
        .route("/apps/{app_id}", get(apps::get_app))
        .route("/apps/{app_id}", put(apps::upsert_app))
        .route("/apps/{app_id}", delete(apps::delete_app))
        // Shared secrets
        .route("/shared-secrets", get(shared_secrets::list_shared_secrets))
        .route("/shared-secrets", post(shared_secrets::create_shared_secret))
        .route(
            "/shared-secrets/{secret_id}",
            get(shared_secrets::get_shared_secret),
        )
        .route(
            "/shared-secrets/{secret_id}",
            put(shared_secrets::upsert_shared_secret),
        )
        .route(
            "/shared-secrets/{secret_id}",
            delete(shared_secrets::delete_shared_secret),
        )
        // Named mappings
        .route("/rues", get(rues::list_rues))
        .route("/rues", post(rues::create_rue))
        .route("/rues/{rue_id}", get(rues::get_rue))
        .route("/rues/{rue_id}", put(rues::upsert_rue))
        .route("/rues/{rue_id}", delete(rues::delete_rue))
}
