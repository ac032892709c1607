//! Application management admin endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::app::{App, AppId};

/// Request to register or replace an application
#[derive(Debug, Clone, Deserialize)]
pub struct AppRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Application response
#[derive(Debug, Clone, Serialize)]
pub struct AppResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&App> for AppResponse {
    fn from(app: &App) -> Self {
        Self {
            id: app.id().as_str().to_string(),
            name: app.name().to_string(),
            description: app.description().map(String::from),
            created_at: app.created_at().to_rfc3339(),
            updated_at: app.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListAppsResponse {
    pub apps: Vec<AppResponse>,
    pub total: usize,
}

/// POST /admin/apps
pub async fn create_app(
    State(state): State<AppState>,
    Json(request): Json<AppRequest>,
) -> Result<Json<AppResponse>, ApiError> {
    debug!(name = %request.name, "Admin registering application");

    let app = state
        .app_service
        .create(request.name, request.description)
        .await?;

    Ok(Json(AppResponse::from(&app)))
}

/// GET /admin/apps
pub async fn list_apps(State(state): State<AppState>) -> Result<Json<ListAppsResponse>, ApiError> {
    let apps = state.app_service.list().await?;
    let apps: Vec<AppResponse> = apps.iter().map(AppResponse::from).collect();
    let total = apps.len();

    Ok(Json(ListAppsResponse { apps, total }))
}

/// GET /admin/apps/:app_id
pub async fn get_app(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<AppResponse>, ApiError> {
    let app = state
        .app_service
        .get(&AppId::new(&app_id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Application '{}' not found", app_id)))?;

    Ok(Json(AppResponse::from(&app)))
}

/// PUT /admin/apps/:app_id
///
/// Creates the application under the given id when it does not exist,
/// replaces its fields when it does.
pub async fn upsert_app(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    Json(request): Json<AppRequest>,
) -> Result<Json<AppResponse>, ApiError> {
    debug!(app_id = %app_id, "Admin upserting application");

    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("application name must not be empty"));
    }

    let id = AppId::new(&app_id);

    let app = match state.app_service.get(&id).await? {
        Some(mut existing) => {
            existing.set_name(request.name);
            existing.set_description(request.description);
            existing
        }
        None => {
            let mut app = App::new(id, request.name);
            if let Some(description) = request.description {
                app = app.with_description(description);
            }
            app
        }
    };

    let app = state.app_service.upsert(app).await?;
    Ok(Json(AppResponse::from(&app)))
}

/// DELETE /admin/apps/:app_id
pub async fn delete_app(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.app_service.delete(&AppId::new(&app_id)).await? {
        return Err(ApiError::not_found(format!(
            "Application '{}' not found",
            app_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
