//! In-memory storage for the auxiliary entity tables

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Single-process backend for tests and local development.
/// Data is gone when the process exits.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Storage pre-populated with entities, for test setup
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            entities: RwLock::new(map),
        }
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities
            .read()
            .map_err(|_| DomainError::storage("storage lock poisoned"))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities
            .write()
            .map_err(|_| DomainError::storage("storage lock poisoned"))
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        Ok(self.read_guard()?.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.read_guard()?.values().cloned().collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write_guard()?;

        if entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "entity '{}' already exists",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write_guard()?;

        if !entities.contains_key(&key) {
            return Err(DomainError::not_found(format!(
                "entity '{}' not found",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.write_guard()?.remove(key.as_str()).is_some())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.read_guard()?.contains_key(key.as_str()))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read_guard()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::app::{App, AppId};

    fn app(id: &str, name: &str) -> App {
        App::new(AppId::new(id), name)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let storage: InMemoryStorage<App> = InMemoryStorage::new();

        storage.create(app("1", "Billing")).await.unwrap();

        let result = storage.get(&AppId::new("1")).await.unwrap();
        assert_eq!(result.unwrap().name(), "Billing");
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let storage: InMemoryStorage<App> = InMemoryStorage::new();

        storage.create(app("1", "Billing")).await.unwrap();
        let result = storage.create(app("1", "Other")).await;

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let storage: InMemoryStorage<App> = InMemoryStorage::new();

        let result = storage.update(app("1", "Billing")).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let storage: InMemoryStorage<App> = InMemoryStorage::new();

        storage.save(app("1", "Original")).await.unwrap();
        storage.save(app("1", "Updated")).await.unwrap();

        let result = storage.get(&AppId::new("1")).await.unwrap();
        assert_eq!(result.unwrap().name(), "Updated");
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage: InMemoryStorage<App> = InMemoryStorage::new();

        storage.create(app("1", "Billing")).await.unwrap();

        assert!(storage.delete(&AppId::new("1")).await.unwrap());
        assert!(!storage.delete(&AppId::new("1")).await.unwrap());
        assert!(!storage.exists(&AppId::new("1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_with_entities() {
        let storage: InMemoryStorage<App> =
            InMemoryStorage::with_entities(vec![app("1", "A"), app("2", "B")]);

        assert_eq!(storage.count().await.unwrap(), 2);
        assert_eq!(storage.list().await.unwrap().len(), 2);
    }
}
