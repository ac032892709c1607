//! Rue service - CRUD over named mappings

use std::sync::Arc;

use tracing::info;

use crate::domain::rue::{Rue, RueId};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Service for managing named mappings
pub struct RueService {
    storage: Arc<dyn Storage<Rue>>,
}

impl RueService {
    pub fn new(storage: Arc<dyn Storage<Rue>>) -> Self {
        Self { storage }
    }

    /// Create a new mapping with a generated id
    pub async fn create(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Rue, DomainError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("mapping name must not be empty"));
        }

        let rue = self.storage.create(Rue::new(RueId::generate(), name, value)).await?;
        info!(rue_id = %rue.id(), name = %rue.name(), "mapping created");

        Ok(rue)
    }

    /// Create or replace a mapping under a known id
    pub async fn upsert(&self, rue: Rue) -> Result<Rue, DomainError> {
        self.storage.save(rue).await
    }

    pub async fn get(&self, id: &RueId) -> Result<Option<Rue>, DomainError> {
        self.storage.get(id).await
    }

    /// Look a mapping up by its name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Rue>, DomainError> {
        let rues = self.storage.list().await?;
        Ok(rues.into_iter().find(|rue| rue.name() == name))
    }

    pub async fn list(&self) -> Result<Vec<Rue>, DomainError> {
        self.storage.list().await
    }

    pub async fn delete(&self, id: &RueId) -> Result<bool, DomainError> {
        let deleted = self.storage.delete(id).await?;

        if deleted {
            info!(rue_id = %id, "mapping deleted");
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service() -> RueService {
        RueService::new(Arc::new(InMemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_name() {
        let service = service();

        let rue = service.create("default-region", "us-east-1").await.unwrap();

        let fetched = service.get_by_name("default-region").await.unwrap().unwrap();
        assert_eq!(fetched.id(), rue.id());
        assert_eq!(fetched.value(), "us-east-1");

        assert!(service.get_by_name("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let service = service();

        let result = service.create("", "value").await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let service = service();
        let rue = service.create("default-region", "us-east-1").await.unwrap();

        let mut updated = rue.clone();
        updated.set_value("eu-west-1");
        service.upsert(updated).await.unwrap();

        let fetched = service.get(rue.id()).await.unwrap().unwrap();
        assert_eq!(fetched.value(), "eu-west-1");
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let rue = service.create("default-region", "us-east-1").await.unwrap();

        assert!(service.delete(rue.id()).await.unwrap());
        assert!(!service.delete(rue.id()).await.unwrap());
    }
}
