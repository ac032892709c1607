//! API key management admin endpoints

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::api_key::{
    ApiKeyId, ApiKeyRecord, InvalidReason, KeyCharset, KeyListFilter, KeyStats, ValidateOptions,
};
use crate::infrastructure::api_key::CreateKeyParams;

/// Request to create a new API key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub charset: Option<KeyCharset>,
    #[serde(default)]
    pub expires_in_secs: Option<i64>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl From<CreateApiKeyRequest> for CreateKeyParams {
    fn from(request: CreateApiKeyRequest) -> Self {
        Self {
            name: request.name,
            prefix: request.prefix,
            length: request.length,
            charset: request.charset,
            expires_in_secs: request.expires_in_secs,
            metadata: request.metadata,
            scopes: request.scopes,
            rate_limit: request.rate_limit,
        }
    }
}

/// API key response for the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: Option<String>,
    pub prefix: String,
    pub suffix: String,
    pub is_active: bool,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub last_used_at: Option<String>,
    pub metadata: HashMap<String, String>,
    pub scopes: Vec<String>,
    pub rate_limit: Option<u32>,
}

impl From<&ApiKeyRecord> for ApiKeyResponse {
    fn from(record: &ApiKeyRecord) -> Self {
        Self {
            id: record.id().as_str().to_string(),
            name: record.name().map(String::from),
            prefix: record.prefix().to_string(),
            suffix: record.suffix().to_string(),
            is_active: record.is_active(),
            created_at: record.created_at().to_rfc3339(),
            expires_at: record.expires_at().map(|dt| dt.to_rfc3339()),
            last_used_at: record.last_used_at().map(|dt| dt.to_rfc3339()),
            metadata: record.metadata().clone(),
            scopes: record.scopes().to_vec(),
            rate_limit: record.rate_limit(),
        }
    }
}

/// API key response with the raw key (only on creation)
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyWithSecretResponse {
    #[serde(flatten)]
    pub api_key: ApiKeyResponse,
    /// The raw key; never returned by any other endpoint
    pub key: String,
}

/// Page size used when the caller sends none
const DEFAULT_PAGE_SIZE: usize = 100;
/// Largest page size the admin API will serve
const MAX_PAGE_SIZE: usize = 1000;
/// Largest offset the store layer can represent
const MAX_OFFSET: usize = i64::MAX as usize;

/// Query parameters for listing keys
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListApiKeysQuery {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub include_expired: bool,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl From<ListApiKeysQuery> for KeyListFilter {
    fn from(query: ListApiKeysQuery) -> Self {
        Self {
            is_active: query.is_active,
            prefix: query.prefix,
            include_expired: query.include_expired,
            offset: query.offset.min(MAX_OFFSET),
            limit: Some(query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)),
        }
    }
}

/// List API keys response
#[derive(Debug, Clone, Serialize)]
pub struct ListApiKeysResponse {
    pub api_keys: Vec<ApiKeyResponse>,
    pub total: usize,
}

/// Request to validate a presented key
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateKeyRequest {
    pub key: String,
    #[serde(default = "default_true")]
    pub update_last_used: bool,
    #[serde(default = "default_true")]
    pub check_rate_limit: bool,
}

fn default_true() -> bool {
    true
}

/// Successful validation response
#[derive(Debug, Clone, Serialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKeyResponse>,
}

/// Request to replace a key's metadata
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMetadataRequest {
    pub metadata: HashMap<String, String>,
}

/// Request to replace a key's scopes
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScopesRequest {
    pub scopes: Vec<String>,
}

/// Request to replace a key's label
#[derive(Debug, Clone, Deserialize)]
pub struct RenameKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /admin/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<Json<ApiKeyWithSecretResponse>, ApiError> {
    debug!("Admin creating API key");

    let created = state.api_key_service.create(request.into()).await?;

    Ok(Json(ApiKeyWithSecretResponse {
        api_key: ApiKeyResponse::from(&created.record),
        key: created.raw_key,
    }))
}

/// GET /admin/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    Query(query): Query<ListApiKeysQuery>,
) -> Result<Json<ListApiKeysResponse>, ApiError> {
    debug!("Admin listing API keys");

    let keys = state.api_key_service.list(&query.into()).await?;
    let api_keys: Vec<ApiKeyResponse> = keys.iter().map(ApiKeyResponse::from).collect();
    let total = api_keys.len();

    Ok(Json(ListApiKeysResponse { api_keys, total }))
}

/// GET /admin/api-keys/stats
pub async fn key_stats(State(state): State<AppState>) -> Result<Json<KeyStats>, ApiError> {
    Ok(Json(state.api_key_service.stats().await?))
}

/// POST /admin/api-keys/validate
///
/// Returns 200 for a usable key. A rejected key yields 401, or 429 when
/// the only problem is the rate limit.
pub async fn validate_api_key(
    State(state): State<AppState>,
    Json(request): Json<ValidateKeyRequest>,
) -> Result<Json<ValidateKeyResponse>, ApiError> {
    let options = ValidateOptions {
        update_last_used: request.update_last_used,
        check_rate_limit: request.check_rate_limit,
    };

    let outcome = state.api_key_service.validate(&request.key, options).await?;

    match outcome.reason {
        None => Ok(Json(ValidateKeyResponse {
            valid: true,
            reason: None,
            api_key: outcome.key.as_ref().map(ApiKeyResponse::from),
        })),
        Some(reason) => Err(ApiError::from_invalid_reason(reason)),
    }
}

/// GET /admin/api-keys/:key_id
pub async fn get_api_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let record = state
        .api_key_service
        .get(&ApiKeyId::new(&key_id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("API key '{}' not found", key_id)))?;

    Ok(Json(ApiKeyResponse::from(&record)))
}

/// POST /admin/api-keys/:key_id/revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    debug!(key_id = %key_id, "Admin revoking API key");

    let id = ApiKeyId::new(&key_id);

    if !state.api_key_service.revoke(&id).await? {
        return Err(ApiError::not_found(format!(
            "API key '{}' not found",
            key_id
        )));
    }

    let record = state
        .api_key_service
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("API key '{}' not found", key_id)))?;

    Ok(Json(ApiKeyResponse::from(&record)))
}

/// DELETE /admin/api-keys/:key_id
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<axum::http::StatusCode, ApiError> {
    debug!(key_id = %key_id, "Admin deleting API key");

    if !state
        .api_key_service
        .delete(&ApiKeyId::new(&key_id))
        .await?
    {
        return Err(ApiError::not_found(format!(
            "API key '{}' not found",
            key_id
        )));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// PUT /admin/api-keys/:key_id/metadata
pub async fn update_api_key_metadata(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
    Json(request): Json<UpdateMetadataRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = ApiKeyId::new(&key_id);

    if !state
        .api_key_service
        .update_metadata(&id, request.metadata)
        .await?
    {
        return Err(ApiError::not_found(format!(
            "API key '{}' not found",
            key_id
        )));
    }

    fetch_response(&state, &id, &key_id).await
}

/// PUT /admin/api-keys/:key_id/scopes
pub async fn update_api_key_scopes(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
    Json(request): Json<UpdateScopesRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = ApiKeyId::new(&key_id);

    if !state
        .api_key_service
        .update_scopes(&id, request.scopes)
        .await?
    {
        return Err(ApiError::not_found(format!(
            "API key '{}' not found",
            key_id
        )));
    }

    fetch_response(&state, &id, &key_id).await
}

/// PUT /admin/api-keys/:key_id/name
pub async fn rename_api_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
    Json(request): Json<RenameKeyRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = ApiKeyId::new(&key_id);

    if !state.api_key_service.rename(&id, request.name).await? {
        return Err(ApiError::not_found(format!(
            "API key '{}' not found",
            key_id
        )));
    }

    fetch_response(&state, &id, &key_id).await
}

async fn fetch_response(
    state: &AppState,
    id: &ApiKeyId,
    key_id: &str,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let record = state
        .api_key_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("API key '{}' not found", key_id)))?;

    Ok(Json(ApiKeyResponse::from(&record)))
}
