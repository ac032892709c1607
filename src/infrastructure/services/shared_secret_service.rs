//! Shared secret service

use std::sync::Arc;

use tracing::info;

use crate::domain::shared_secret::{SharedSecret, SharedSecretId};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Service for managing shared secrets.
/// Secret values never appear in log output.
pub struct SharedSecretService {
    storage: Arc<dyn Storage<SharedSecret>>,
}

impl SharedSecretService {
    pub fn new(storage: Arc<dyn Storage<SharedSecret>>) -> Self {
        Self { storage }
    }

    /// Store a new secret under a generated id
    pub async fn create(
        &self,
        secret: impl Into<String>,
        description: Option<String>,
    ) -> Result<SharedSecret, DomainError> {
        let secret = secret.into();

        if secret.is_empty() {
            return Err(DomainError::validation("secret value must not be empty"));
        }

        let mut entry = SharedSecret::new(SharedSecretId::generate(), secret);
        if let Some(description) = description {
            entry = entry.with_description(description);
        }

        let entry = self.storage.create(entry).await?;
        info!(secret_id = %entry.id(), "shared secret stored");

        Ok(entry)
    }

    /// Create or replace a secret under a known id
    pub async fn upsert(&self, secret: SharedSecret) -> Result<SharedSecret, DomainError> {
        self.storage.save(secret).await
    }

    pub async fn get(&self, id: &SharedSecretId) -> Result<Option<SharedSecret>, DomainError> {
        self.storage.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<SharedSecret>, DomainError> {
        self.storage.list().await
    }

    pub async fn delete(&self, id: &SharedSecretId) -> Result<bool, DomainError> {
        let deleted = self.storage.delete(id).await?;

        if deleted {
            info!(secret_id = %id, "shared secret deleted");
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service() -> SharedSecretService {
        SharedSecretService::new(Arc::new(InMemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();

        let secret = service.create("hunter2", None).await.unwrap();

        let fetched = service.get(secret.id()).await.unwrap().unwrap();
        assert_eq!(fetched.secret(), "hunter2");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_secret() {
        let service = service();

        let result = service.create("", None).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rotate_via_upsert() {
        let service = service();
        let secret = service.create("old-value", None).await.unwrap();

        let mut rotated = secret.clone();
        rotated.set_secret("new-value");
        service.upsert(rotated).await.unwrap();

        let fetched = service.get(secret.id()).await.unwrap().unwrap();
        assert_eq!(fetched.secret(), "new-value");
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let secret = service.create("hunter2", None).await.unwrap();

        assert!(service.delete(secret.id()).await.unwrap());
        assert!(!service.delete(secret.id()).await.unwrap());
    }
}
