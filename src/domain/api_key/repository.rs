//! API key storage contract
//!
//! The service depends on this trait only; atomicity of the rate counter
//! is delegated to the backing store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{ApiKeyId, ApiKeyRecord, KeyListFilter, KeyStats};
use crate::domain::DomainError;

/// Repository trait for API key records and their rate-limit windows
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Insert a new record; fails on duplicate id or duplicate key hash
    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError>;

    /// Look up a record by its key hash (the validation hot path)
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Look up a record by id
    async fn get_by_id(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Replace an existing record; returns whether a row was changed
    async fn update(&self, record: &ApiKeyRecord) -> Result<bool, DomainError>;

    /// Remove a record and cascade-delete its rate windows
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// List records matching the filter, creation-time descending
    async fn list(&self, filter: &KeyListFilter) -> Result<Vec<ApiKeyRecord>, DomainError>;

    /// Aggregate counts at the given instant
    ///
    /// Each bucket is an independent count; the buckets are deliberately
    /// non-exclusive and need not sum to `total`.
    async fn stats(&self, now: DateTime<Utc>) -> Result<KeyStats, DomainError>;

    /// Atomically increment-or-initialize the counter for
    /// `(key_id, window_start)`, refusing to pass `limit`.
    ///
    /// Returns the count after the increment, or `None` when the window is
    /// already at the limit (in which case nothing was written).
    async fn rate_counter_increment(
        &self,
        key_id: &ApiKeyId,
        window_start: i64,
        limit: u32,
    ) -> Result<Option<u32>, DomainError>;

    /// Drop counters for windows that started before the threshold.
    /// Advisory housekeeping; stale counters are never read again.
    async fn rate_counter_purge_before(&self, threshold: i64) -> Result<u64, DomainError>;
}
