//! In-memory API key repository
//!
//! Single-process backend for tests and local development. All state
//! sits behind one `RwLock` so that the rate counter check-and-increment
//! is atomic with respect to concurrent callers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::api_key::{
    ApiKeyId, ApiKeyRecord, ApiKeyRepository, KeyListFilter, KeyStats,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Inner {
    /// Records by id
    keys: HashMap<String, ApiKeyRecord>,
    /// Secondary index: key hash -> id
    hash_index: HashMap<String, String>,
    /// Rate counters by (key id, window start)
    windows: HashMap<(String, i64), u32>,
}

/// In-memory implementation of [`ApiKeyRepository`]
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    inner: RwLock<Inner>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn window_count(&self) -> usize {
        self.inner.read().await.windows.len()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let mut inner = self.inner.write().await;

        if inner.keys.contains_key(record.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "API key '{}' already exists",
                record.id()
            )));
        }

        if inner.hash_index.contains_key(record.key_hash()) {
            return Err(DomainError::conflict(
                "a key with the same hash already exists",
            ));
        }

        inner
            .hash_index
            .insert(record.key_hash().to_string(), record.id().as_str().to_string());
        inner
            .keys
            .insert(record.id().as_str().to_string(), record.clone());

        Ok(record)
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .hash_index
            .get(key_hash)
            .and_then(|id| inner.keys.get(id))
            .cloned())
    }

    async fn get_by_id(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError> {
        Ok(self.inner.read().await.keys.get(id.as_str()).cloned())
    }

    async fn update(&self, record: &ApiKeyRecord) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;

        if !inner.keys.contains_key(record.id().as_str()) {
            return Ok(false);
        }

        inner
            .keys
            .insert(record.id().as_str().to_string(), record.clone());

        Ok(true)
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;

        let Some(record) = inner.keys.remove(id.as_str()) else {
            return Ok(false);
        };

        inner.hash_index.remove(record.key_hash());
        inner.windows.retain(|(key_id, _), _| key_id != id.as_str());

        Ok(true)
    }

    async fn list(&self, filter: &KeyListFilter) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let inner = self.inner.read().await;
        let now = Utc::now();

        let mut records: Vec<ApiKeyRecord> = inner
            .keys
            .values()
            .filter(|record| {
                if let Some(is_active) = filter.is_active {
                    if record.is_active() != is_active {
                        return false;
                    }
                }

                if let Some(prefix) = &filter.prefix {
                    if record.prefix() != prefix {
                        return false;
                    }
                }

                if !filter.include_expired && record.is_expired_at(now) {
                    return false;
                }

                true
            })
            .cloned()
            .collect();

        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let records = records
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(records)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<KeyStats, DomainError> {
        let inner = self.inner.read().await;
        let records = inner.keys.values();

        Ok(KeyStats {
            total: inner.keys.len(),
            active: records
                .clone()
                .filter(|r| r.is_active() && !r.is_expired_at(now))
                .count(),
            expired: records.clone().filter(|r| r.is_expired_at(now)).count(),
            revoked: records.filter(|r| !r.is_active()).count(),
        })
    }

    async fn rate_counter_increment(
        &self,
        key_id: &ApiKeyId,
        window_start: i64,
        limit: u32,
    ) -> Result<Option<u32>, DomainError> {
        let mut inner = self.inner.write().await;
        let counter = inner
            .windows
            .entry((key_id.as_str().to_string(), window_start))
            .or_insert(0);

        if *counter >= limit {
            return Ok(None);
        }

        *counter += 1;
        Ok(Some(*counter))
    }

    async fn rate_counter_purge_before(&self, threshold: i64) -> Result<u64, DomainError> {
        let mut inner = self.inner.write().await;
        let before = inner.windows.len();

        inner.windows.retain(|(_, start), _| *start >= threshold);

        Ok((before - inner.windows.len()) as u64)
    }
}
