//! Named mapping ("rue") admin endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::rue::{Rue, RueId};

/// Request to create or replace a mapping
#[derive(Debug, Clone, Deserialize)]
pub struct RueRequest {
    pub name: String,
    pub value: String,
}

/// Mapping response
#[derive(Debug, Clone, Serialize)]
pub struct RueResponse {
    pub id: String,
    pub name: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Rue> for RueResponse {
    fn from(rue: &Rue) -> Self {
        Self {
            id: rue.id().as_str().to_string(),
            name: rue.name().to_string(),
            value: rue.value().to_string(),
            created_at: rue.created_at().to_rfc3339(),
            updated_at: rue.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRuesResponse {
    pub rues: Vec<RueResponse>,
    pub total: usize,
}

/// POST /admin/rues
pub async fn create_rue(
    State(state): State<AppState>,
    Json(request): Json<RueRequest>,
) -> Result<Json<RueResponse>, ApiError> {
    debug!(name = %request.name, "Admin creating mapping");

    let rue = state.rue_service.create(request.name, request.value).await?;

    Ok(Json(RueResponse::from(&rue)))
}

/// GET /admin/rues
pub async fn list_rues(State(state): State<AppState>) -> Result<Json<ListRuesResponse>, ApiError> {
    let rues = state.rue_service.list().await?;
    let rues: Vec<RueResponse> = rues.iter().map(RueResponse::from).collect();
    let total = rues.len();

    Ok(Json(ListRuesResponse { rues, total }))
}

/// GET /admin/rues/:rue_id
pub async fn get_rue(
    State(state): State<AppState>,
    Path(rue_id): Path<String>,
) -> Result<Json<RueResponse>, ApiError> {
    let rue = state
        .rue_service
        .get(&RueId::new(&rue_id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Mapping '{}' not found", rue_id)))?;

    Ok(Json(RueResponse::from(&rue)))
}

/// PUT /admin/rues/:rue_id
pub async fn upsert_rue(
    State(state): State<AppState>,
    Path(rue_id): Path<String>,
    Json(request): Json<RueRequest>,
) -> Result<Json<RueResponse>, ApiError> {
    debug!(rue_id = %rue_id, "Admin upserting mapping");

    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("mapping name must not be empty"));
    }

    let id = RueId::new(&rue_id);

    let rue = match state.rue_service.get(&id).await? {
        Some(mut existing) => {
            existing.set_value(request.value);
            existing
        }
        None => Rue::new(id, request.name, request.value),
    };

    let rue = state.rue_service.upsert(rue).await?;
    Ok(Json(RueResponse::from(&rue)))
}

/// DELETE /admin/rues/:rue_id
pub async fn delete_rue(
    State(state): State<AppState>,
    Path(rue_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.rue_service.delete(&RueId::new(&rue_id)).await? {
        return Err(ApiError::not_found(format!(
            "Mapping '{}' not found",
            rue_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let request: RueRequest =
            serde_json::from_str(r#"{"name": "default-region", "value": "us-east-1"}"#).unwrap();

        assert_eq!(request.name, "default-region");
        assert_eq!(request.value, "us-east-1");
    }

    #[test]
    fn test_response_from_entity() {
        let rue = Rue::new(RueId::new("r-1"), "default-region", "us-east-1");
        let response = RueResponse::from(&rue);

        assert_eq!(response.id, "r-1");
        assert_eq!(response.name, "default-region");
        assert_eq!(response.value, "us-east-1");
    }
}
