//! Application state for shared services

use std::sync::Arc;

use crate::domain::api_key::{
    ApiKeyId, ApiKeyRecord, ApiKeyRepository, KeyListFilter, KeyStats, ValidateOptions,
    ValidationOutcome,
};
use crate::domain::DomainError;
use crate::infrastructure::api_key::{ApiKeyService, CreateKeyParams, CreatedKey};
use crate::infrastructure::services::{AppService, RueService, SharedSecretService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    pub app_service: Arc<AppService>,
    pub shared_secret_service: Arc<SharedSecretService>,
    pub rue_service: Arc<RueService>,
}

/// Trait for API key service operations
#[async_trait::async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn create(&self, params: CreateKeyParams) -> Result<CreatedKey, DomainError>;
    async fn validate(
        &self,
        raw_key: &str,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, DomainError>;
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError>;
    async fn revoke(&self, id: &ApiKeyId) -> Result<bool, DomainError>;
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;
    async fn list(&self, filter: &KeyListFilter) -> Result<Vec<ApiKeyRecord>, DomainError>;
    async fn stats(&self) -> Result<KeyStats, DomainError>;
    async fn update_metadata(
        &self,
        id: &ApiKeyId,
        metadata: std::collections::HashMap<String, String>,
    ) -> Result<bool, DomainError>;
    async fn update_scopes(&self, id: &ApiKeyId, scopes: Vec<String>)
        -> Result<bool, DomainError>;
    async fn rename(&self, id: &ApiKeyId, name: Option<String>) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
impl<R: ApiKeyRepository + 'static> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn create(&self, params: CreateKeyParams) -> Result<CreatedKey, DomainError> {
        ApiKeyService::create(self, params).await
    }

    async fn validate(
        &self,
        raw_key: &str,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, DomainError> {
        ApiKeyService::validate(self, raw_key, options).await
    }

    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError> {
        ApiKeyService::get(self, id).await
    }

    async fn revoke(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        ApiKeyService::revoke(self, id).await
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        ApiKeyService::delete(self, id).await
    }

    async fn list(&self, filter: &KeyListFilter) -> Result<Vec<ApiKeyRecord>, DomainError> {
        ApiKeyService::list(self, filter).await
    }

    async fn stats(&self) -> Result<KeyStats, DomainError> {
        ApiKeyService::stats(self).await
    }

    async fn update_metadata(
        &self,
        id: &ApiKeyId,
        metadata: std::collections::HashMap<String, String>,
    ) -> Result<bool, DomainError> {
        ApiKeyService::update_metadata(self, id, metadata).await
    }

    async fn update_scopes(
        &self,
        id: &ApiKeyId,
        scopes: Vec<String>,
    ) -> Result<bool, DomainError> {
        ApiKeyService::update_scopes(self, id, scopes).await
    }

    async fn rename(&self, id: &ApiKeyId, name: Option<String>) -> Result<bool, DomainError> {
        ApiKeyService::rename(self, id, name).await
    }
}
