//! Shared secret management admin endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::shared_secret::{SharedSecret, SharedSecretId};

/// Request to store or replace a shared secret
#[derive(Debug, Clone, Deserialize)]
pub struct SharedSecretRequest {
    pub secret: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Shared secret response; the secret value is included, this endpoint
/// is the retrieval mechanism for out-of-band integrations.
#[derive(Debug, Clone, Serialize)]
pub struct SharedSecretResponse {
    pub id: String,
    pub secret: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&SharedSecret> for SharedSecretResponse {
    fn from(secret: &SharedSecret) -> Self {
        Self {
            id: secret.id().as_str().to_string(),
            secret: secret.secret().to_string(),
            description: secret.description().map(String::from),
            created_at: secret.created_at().to_rfc3339(),
            updated_at: secret.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSharedSecretsResponse {
    pub shared_secrets: Vec<SharedSecretResponse>,
    pub total: usize,
}

/// POST /admin/shared-secrets
pub async fn create_shared_secret(
    State(state): State<AppState>,
    Json(request): Json<SharedSecretRequest>,
) -> Result<Json<SharedSecretResponse>, ApiError> {
    debug!("Admin storing shared secret");

    let secret = state
        .shared_secret_service
        .create(request.secret, request.description)
        .await?;

    Ok(Json(SharedSecretResponse::from(&secret)))
}

/// GET /admin/shared-secrets
pub async fn list_shared_secrets(
    State(state): State<AppState>,
) -> Result<Json<ListSharedSecretsResponse>, ApiError> {
    let secrets = state.shared_secret_service.list().await?;
    let shared_secrets: Vec<SharedSecretResponse> =
        secrets.iter().map(SharedSecretResponse::from).collect();
    let total = shared_secrets.len();

    Ok(Json(ListSharedSecretsResponse {
        shared_secrets,
        total,
    }))
}

/// GET /admin/shared-secrets/:secret_id
pub async fn get_shared_secret(
    State(state): State<AppState>,
    Path(secret_id): Path<String>,
) -> Result<Json<SharedSecretResponse>, ApiError> {
    let secret = state
        .shared_secret_service
        .get(&SharedSecretId::new(&secret_id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Shared secret '{}' not found", secret_id)))?;

    Ok(Json(SharedSecretResponse::from(&secret)))
}

/// PUT /admin/shared-secrets/:secret_id
pub async fn upsert_shared_secret(
    State(state): State<AppState>,
    Path(secret_id): Path<String>,
    Json(request): Json<SharedSecretRequest>,
) -> Result<Json<SharedSecretResponse>, ApiError> {
    debug!(secret_id = %secret_id, "Admin upserting shared secret");

    if request.secret.is_empty() {
        return Err(ApiError::bad_request("secret value must not be empty"));
    }

    let id = SharedSecretId::new(&secret_id);

    let secret = match state.shared_secret_service.get(&id).await? {
        Some(mut existing) => {
            existing.set_secret(request.secret);
            existing.set_description(request.description);
            existing
        }
        None => {
            let mut secret = SharedSecret::new(id, request.secret);
            if let Some(description) = request.description {
                secret = secret.with_description(description);
            }
            secret
        }
    };

    let secret = state.shared_secret_service.upsert(secret).await?;
    Ok(Json(SharedSecretResponse::from(&secret)))
}

/// DELETE /admin/shared-secrets/:secret_id
pub async fn delete_shared_secret(
    State(state): State<AppState>,
    Path(secret_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state
        .shared_secret_service
        .delete(&SharedSecretId::new(&secret_id))
        .await?
    {
        return Err(ApiError::not_found(format!(
            "Shared secret '{}' not found",
            secret_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
