//! API key service
//!
//! High-level operations over key issuance, validation and lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::domain::api_key::{
    validate_key_spec, validate_rate_limit, ApiKeyId, ApiKeyRecord, ApiKeyRepository,
    InvalidReason, KeyCharset, KeyListFilter, KeySpec, KeyStats, ValidateOptions,
    ValidationOutcome,
};
use crate::domain::DomainError;

use super::generator::KeyGenerator;
use super::rate_limiter::RateLimiter;

/// Parameters for creating a key
///
/// Generation fields left as `None` fall back to the service's default
/// key shape.
#[derive(Debug, Clone, Default)]
pub struct CreateKeyParams {
    pub name: Option<String>,
    pub prefix: Option<String>,
    pub length: Option<usize>,
    pub charset: Option<KeyCharset>,
    /// Lifetime relative to now; a zero or negative value creates a key
    /// that is already expired
    pub expires_in_secs: Option<i64>,
    pub metadata: Option<HashMap<String, String>>,
    pub scopes: Option<Vec<String>>,
    pub rate_limit: Option<u32>,
}

/// Result of creating a new API key
#[derive(Debug)]
pub struct CreatedKey {
    /// The stored record (holds only the hash)
    pub record: ApiKeyRecord,
    /// The full raw key; this is the only time it is available
    pub raw_key: String,
}

/// API key service
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    generator: KeyGenerator,
    rate_limiter: RateLimiter<R>,
    default_spec: KeySpec,
}

impl<R: ApiKeyRepository> ApiKeyService<R> {
    /// Create a new API key service
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            rate_limiter: RateLimiter::new(Arc::clone(&repository)),
            repository,
            generator: KeyGenerator::new(),
            default_spec: KeySpec::default(),
        }
    }

    /// Override the default key shape
    pub fn with_default_spec(mut self, spec: KeySpec) -> Self {
        self.default_spec = spec;
        self
    }

    /// Create a new API key
    ///
    /// Configuration is validated before any randomness or store call,
    /// so a bad request leaves no trace.
    pub async fn create(&self, params: CreateKeyParams) -> Result<CreatedKey, DomainError> {
        let spec = KeySpec {
            prefix: params
                .prefix
                .unwrap_or_else(|| self.default_spec.prefix.clone()),
            length: params.length.unwrap_or(self.default_spec.length),
            charset: params.charset.unwrap_or(self.default_spec.charset),
        };

        validate_key_spec(&spec).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_rate_limit(params.rate_limit)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        let lifetime = params
            .expires_in_secs
            .map(|secs| {
                Duration::try_seconds(secs)
                    .ok_or_else(|| DomainError::validation("expires_in_secs is out of range"))
            })
            .transpose()?;

        let generated = self.generator.generate(&spec);
        let id = ApiKeyId::generate();

        let mut record = ApiKeyRecord::new(
            id.clone(),
            generated.key_hash,
            &spec.prefix,
            generated.suffix,
        );

        if let Some(name) = params.name {
            record = record.with_name(name);
        }
        if let Some(lifetime) = lifetime {
            let expires_at = record
                .created_at()
                .checked_add_signed(lifetime)
                .ok_or_else(|| DomainError::validation("expires_in_secs is out of range"))?;
            record = record.with_expires_at(expires_at);
        }
        if let Some(metadata) = params.metadata {
            record = record.with_metadata(metadata);
        }
        if let Some(scopes) = params.scopes {
            record = record.with_scopes(scopes);
        }
        if let Some(rate_limit) = params.rate_limit {
            record = record.with_rate_limit(rate_limit);
        }

        let record = self.repository.insert(record).await?;

        info!(key_id = %id, prefix = %spec.prefix, "API key created");

        Ok(CreatedKey {
            record,
            raw_key: generated.raw_key,
        })
    }

    /// Validate a presented raw key.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// not found, revoked, expired, rate limited.
    pub async fn validate(
        &self,
        raw_key: &str,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, DomainError> {
        let key_hash = self.generator.hash_key(raw_key);

        let Some(mut record) = self.repository.get_by_hash(&key_hash).await? else {
            debug!("validation failed: no matching key");
            return Ok(ValidationOutcome::not_found());
        };

        if !record.is_active() {
            debug!(key_id = %record.id(), "validation failed: key revoked");
            return Ok(ValidationOutcome::rejected(InvalidReason::Revoked, record));
        }

        let now = Utc::now();

        if record.is_expired_at(now) {
            debug!(key_id = %record.id(), "validation failed: key expired");
            return Ok(ValidationOutcome::rejected(InvalidReason::Expired, record));
        }

        if options.check_rate_limit
            && !self
                .rate_limiter
                .allow(record.id(), record.rate_limit(), now)
                .await?
        {
            debug!(key_id = %record.id(), "validation failed: rate limited");
            return Ok(ValidationOutcome::rejected(
                InvalidReason::RateLimited,
                record,
            ));
        }

        if options.update_last_used {
            record.record_usage(now);
            self.repository.update(&record).await?;
        }

        Ok(ValidationOutcome::valid(record))
    }

    /// Get a key record by id
    pub async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError> {
        self.repository.get_by_id(id).await
    }

    /// Revoke a key. One-way and idempotent: returns true whenever a
    /// record exists, whether or not it was still active.
    pub async fn revoke(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let Some(mut record) = self.repository.get_by_id(id).await? else {
            return Ok(false);
        };

        if record.is_active() {
            record.revoke();
            self.repository.update(&record).await?;
            info!(key_id = %id, "API key revoked");
        }

        Ok(true)
    }

    /// Permanently delete a key and its rate counters
    pub async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let deleted = self.repository.delete(id).await?;

        if deleted {
            info!(key_id = %id, "API key deleted");
        }

        Ok(deleted)
    }

    /// List keys matching a filter, newest first
    pub async fn list(&self, filter: &KeyListFilter) -> Result<Vec<ApiKeyRecord>, DomainError> {
        self.repository.list(filter).await
    }

    /// Aggregate key counts as of now
    pub async fn stats(&self) -> Result<KeyStats, DomainError> {
        self.repository.stats(Utc::now()).await
    }

    /// Replace a key's metadata map wholesale
    pub async fn update_metadata(
        &self,
        id: &ApiKeyId,
        metadata: HashMap<String, String>,
    ) -> Result<bool, DomainError> {
        self.mutate(id, |record| record.set_metadata(metadata)).await
    }

    /// Replace a key's scope list wholesale
    pub async fn update_scopes(
        &self,
        id: &ApiKeyId,
        scopes: Vec<String>,
    ) -> Result<bool, DomainError> {
        self.mutate(id, |record| record.set_scopes(scopes)).await
    }

    /// Replace a key's label
    pub async fn rename(&self, id: &ApiKeyId, name: Option<String>) -> Result<bool, DomainError> {
        self.mutate(id, |record| record.set_name(name)).await
    }

    async fn mutate(
        &self,
        id: &ApiKeyId,
        apply: impl FnOnce(&mut ApiKeyRecord) + Send,
    ) -> Result<bool, DomainError> {
        let Some(mut record) = self.repository.get_by_id(id).await? else {
            return Ok(false);
        };

        apply(&mut record);
        self.repository.update(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;

    fn service() -> ApiKeyService<InMemoryApiKeyRepository> {
        ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    fn no_limit_check() -> ValidateOptions {
        ValidateOptions {
            update_last_used: true,
            check_rate_limit: false,
        }
    }

    #[tokio::test]
    async fn test_create_returns_raw_key_once() {
        let service = service();

        let created = service
            .create(CreateKeyParams {
                name: Some("CI deploys".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(created.raw_key.starts_with("rapids_"));
        assert_eq!(created.record.name(), Some("CI deploys"));
        // The record never carries the raw key, only its digest
        assert_ne!(created.record.key_hash(), created.raw_key);
        assert_eq!(created.record.key_hash().len(), 64);
        assert_eq!(
            created.record.suffix(),
            &created.raw_key[created.raw_key.len() - 4..]
        );
    }

    #[tokio::test]
    async fn test_create_with_custom_shape() {
        let service = service();

        let created = service
            .create(CreateKeyParams {
                prefix: Some("sk_".to_string()),
                length: Some(16),
                charset: Some(KeyCharset::Hex),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.raw_key.len(), "sk_".len() + 16);
        assert!(created.raw_key["sk_".len()..]
            .chars()
            .all(|c| KeyCharset::Hex.contains(c)));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_config() {
        let service = service();

        let result = service
            .create(CreateKeyParams {
                length: Some(0),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let result = service
            .create(CreateKeyParams {
                rate_limit: Some(0),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        // Nothing was stored by the failed attempts
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_expiry() {
        let service = service();

        for secs in [i64::MAX, i64::MIN, i64::MAX / 1000] {
            let result = service
                .create(CreateKeyParams {
                    expires_in_secs: Some(secs),
                    ..Default::default()
                })
                .await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_create_with_expiry_sets_expires_at() {
        let service = service();

        let created = service
            .create(CreateKeyParams {
                expires_in_secs: Some(3600),
                ..Default::default()
            })
            .await
            .unwrap();

        let expires_at = created.record.expires_at().unwrap();
        assert_eq!(
            (expires_at - created.record.created_at()).num_seconds(),
            3600
        );
    }

    #[tokio::test]
    async fn test_validate_happy_path_records_usage() {
        let service = service();
        let created = service.create(CreateKeyParams::default()).await.unwrap();

        let outcome = service
            .validate(&created.raw_key, ValidateOptions::default())
            .await
            .unwrap();

        assert!(outcome.valid);
        assert!(outcome.reason.is_none());
        let key = outcome.key.unwrap();
        assert!(key.last_used_at().is_some());

        // Persisted, not just returned
        let stored = service.get(created.record.id()).await.unwrap().unwrap();
        assert!(stored.last_used_at().is_some());
    }

    #[tokio::test]
    async fn test_validate_without_usage_tracking() {
        let service = service();
        let created = service.create(CreateKeyParams::default()).await.unwrap();

        let outcome = service
            .validate(
                &created.raw_key,
                ValidateOptions {
                    update_last_used: false,
                    check_rate_limit: true,
                },
            )
            .await
            .unwrap();

        assert!(outcome.valid);
        let stored = service.get(created.record.id()).await.unwrap().unwrap();
        assert!(stored.last_used_at().is_none());
    }

    #[tokio::test]
    async fn test_validate_unknown_key() {
        let service = service();

        let outcome = service
            .validate("rapids_doesnotexist", ValidateOptions::default())
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some(InvalidReason::NotFound));
        assert!(outcome.key.is_none());
    }

    #[tokio::test]
    async fn test_validate_revoked_key() {
        let service = service();
        let created = service.create(CreateKeyParams::default()).await.unwrap();

        assert!(service.revoke(created.record.id()).await.unwrap());

        let outcome = service
            .validate(&created.raw_key, ValidateOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.reason, Some(InvalidReason::Revoked));
        assert!(outcome.key.is_some());
    }

    #[tokio::test]
    async fn test_validate_expired_key() {
        let service = service();
        let created = service
            .create(CreateKeyParams {
                expires_in_secs: Some(-1),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = service
            .validate(&created.raw_key, ValidateOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.reason, Some(InvalidReason::Expired));
    }

    #[tokio::test]
    async fn test_revoked_wins_over_expired() {
        let service = service();
        let created = service
            .create(CreateKeyParams {
                expires_in_secs: Some(-1),
                ..Default::default()
            })
            .await
            .unwrap();

        service.revoke(created.record.id()).await.unwrap();

        let outcome = service
            .validate(&created.raw_key, ValidateOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.reason, Some(InvalidReason::Revoked));
    }

    #[tokio::test]
    async fn test_rate_limit_enforced() {
        let service = service();
        let created = service
            .create(CreateKeyParams {
                rate_limit: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();

        for _ in 0..3 {
            let outcome = service
                .validate(&created.raw_key, ValidateOptions::default())
                .await
                .unwrap();
            assert!(outcome.valid);
        }

        let outcome = service
            .validate(&created.raw_key, ValidateOptions::default())
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.reason, Some(InvalidReason::RateLimited));
    }

    #[tokio::test]
    async fn test_rate_limit_skipped_on_request() {
        let service = service();
        let created = service
            .create(CreateKeyParams {
                rate_limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        // Opting out of the check never consumes the window
        for _ in 0..5 {
            let outcome = service
                .validate(&created.raw_key, no_limit_check())
                .await
                .unwrap();
            assert!(outcome.valid);
        }
    }

    #[tokio::test]
    async fn test_unlimited_key_never_rate_limited() {
        let service = service();
        let created = service.create(CreateKeyParams::default()).await.unwrap();

        for _ in 0..120 {
            let outcome = service
                .validate(&created.raw_key, ValidateOptions::default())
                .await
                .unwrap();
            assert!(outcome.valid);
        }
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let service = service();
        let created = service.create(CreateKeyParams::default()).await.unwrap();

        assert!(service.revoke(created.record.id()).await.unwrap());
        assert!(service.revoke(created.record.id()).await.unwrap());
        assert!(!service.revoke(&ApiKeyId::new("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let created = service.create(CreateKeyParams::default()).await.unwrap();

        assert!(service.delete(created.record.id()).await.unwrap());
        assert!(!service.delete(created.record.id()).await.unwrap());

        let outcome = service
            .validate(&created.raw_key, ValidateOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.reason, Some(InvalidReason::NotFound));
    }

    #[tokio::test]
    async fn test_mutations_replace_wholesale() {
        let service = service();
        let created = service
            .create(CreateKeyParams {
                metadata: Some(HashMap::from([(
                    "env".to_string(),
                    "staging".to_string(),
                )])),
                scopes: Some(vec!["read".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = created.record.id();

        assert!(service
            .update_metadata(
                id,
                HashMap::from([("team".to_string(), "infra".to_string())])
            )
            .await
            .unwrap());
        assert!(service
            .update_scopes(id, vec!["write".to_string()])
            .await
            .unwrap());
        assert!(service
            .rename(id, Some("renamed".to_string()))
            .await
            .unwrap());

        let stored = service.get(id).await.unwrap().unwrap();
        assert!(!stored.metadata().contains_key("env"));
        assert_eq!(stored.scopes(), ["write".to_string()]);
        assert_eq!(stored.name(), Some("renamed"));

        assert!(!service
            .rename(&ApiKeyId::new("missing"), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_stats() {
        let service = service();

        service.create(CreateKeyParams::default()).await.unwrap();
        service.create(CreateKeyParams::default()).await.unwrap();

        let revoked = service.create(CreateKeyParams::default()).await.unwrap();
        service.revoke(revoked.record.id()).await.unwrap();

        service
            .create(CreateKeyParams {
                expires_in_secs: Some(-10),
                ..Default::default()
            })
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.revoked, 1);
    }
}
