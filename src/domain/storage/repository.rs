//! Generic CRUD contract shared by every storage backend

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Keyed CRUD over one entity type. `create` refuses an existing key
/// and `update` refuses a missing one; `save` is the upsert built from
/// the two. `exists` and `count` have workable defaults that backends
/// override with cheaper queries.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    async fn list(&self) -> Result<Vec<E>, DomainError>;

    async fn create(&self, entity: E) -> Result<E, DomainError>;

    async fn update(&self, entity: E) -> Result<E, DomainError>;

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        match self.exists(entity.key()).await? {
            true => self.update(entity).await,
            false => self.create(entity).await,
        }
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}
