//! PostgreSQL API key repository
//!
//! Key records live as JSONB alongside the columns the queries filter
//! on. Rate windows are a separate table keyed by (key_id, window_start)
//! with a foreign key back to the key, so deleting a key drops its
//! counters in the same statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::{QueryBuilder, Row};

use crate::domain::api_key::{
    ApiKeyId, ApiKeyRecord, ApiKeyRepository, KeyListFilter, KeyStats,
};
use crate::domain::DomainError;

const CREATE_API_KEYS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS api_keys (
    id VARCHAR(255) PRIMARY KEY,
    key_hash VARCHAR(64) NOT NULL UNIQUE,
    prefix TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ,
    is_active BOOLEAN NOT NULL,
    data JSONB NOT NULL
)
"#;

const CREATE_RATE_WINDOWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS rate_windows (
    key_id VARCHAR(255) NOT NULL REFERENCES api_keys(id) ON DELETE CASCADE,
    window_start BIGINT NOT NULL,
    request_count INTEGER NOT NULL,
    PRIMARY KEY (key_id, window_start)
)
"#;

/// PostgreSQL implementation of [`ApiKeyRepository`]
#[derive(Debug)]
pub struct PgApiKeyRepository {
    pool: PgPool,
}

impl PgApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the key and rate window tables if they do not exist.
    /// Called explicitly once at startup, never lazily per request.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        for statement in [CREATE_API_KEYS_TABLE, CREATE_RATE_WINDOWS_TABLE] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create schema: {}", e)))?;
        }

        Ok(())
    }

    fn encode(record: &ApiKeyRecord) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(record)
            .map_err(|e| DomainError::storage(format!("Failed to serialize key record: {}", e)))
    }

    fn decode(row: &sqlx::postgres::PgRow) -> Result<ApiKeyRecord, DomainError> {
        let data: serde_json::Value = row.get("data");
        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize key record: {}", e)))
    }
}

#[async_trait]
impl ApiKeyRepository for PgApiKeyRepository {
    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let data = Self::encode(&record)?;

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, key_hash, prefix, created_at, expires_at, is_active, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id().as_str())
        .bind(record.key_hash())
        .bind(record.prefix())
        .bind(record.created_at())
        .bind(record.expires_at())
        .bind(record.is_active())
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                DomainError::conflict(format!("API key '{}' already exists", record.id()))
            } else {
                DomainError::storage(format!("Failed to insert key: {}", e))
            }
        })?;

        Ok(record)
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query("SELECT data FROM api_keys WHERE key_hash = $1")
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get key by hash: {}", e)))?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn get_by_id(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query("SELECT data FROM api_keys WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get key: {}", e)))?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn update(&self, record: &ApiKeyRecord) -> Result<bool, DomainError> {
        let data = Self::encode(record)?;

        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET expires_at = $2, is_active = $3, data = $4
            WHERE id = $1
            "#,
        )
        .bind(record.id().as_str())
        .bind(record.expires_at())
        .bind(record.is_active())
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        // Rate windows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &KeyListFilter) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let mut query = QueryBuilder::new("SELECT data FROM api_keys WHERE 1 = 1");

        if let Some(is_active) = filter.is_active {
            query.push(" AND is_active = ").push_bind(is_active);
        }

        if let Some(prefix) = &filter.prefix {
            query.push(" AND prefix = ").push_bind(prefix);
        }

        if !filter.include_expired {
            query
                .push(" AND (expires_at IS NULL OR expires_at > ")
                .push_bind(Utc::now())
                .push(")");
        }

        query.push(" ORDER BY created_at DESC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        query.push(" OFFSET ").push_bind(filter.offset as i64);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list keys: {}", e)))?;

        rows.iter().map(Self::decode).collect()
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<KeyStats, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (
                    WHERE is_active AND (expires_at IS NULL OR expires_at > $1)
                ) AS active,
                COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at <= $1) AS expired,
                COUNT(*) FILTER (WHERE NOT is_active) AS revoked
            FROM api_keys
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to compute stats: {}", e)))?;

        Ok(KeyStats {
            total: row.get::<i64, _>("total") as usize,
            active: row.get::<i64, _>("active") as usize,
            expired: row.get::<i64, _>("expired") as usize,
            revoked: row.get::<i64, _>("revoked") as usize,
        })
    }

    async fn rate_counter_increment(
        &self,
        key_id: &ApiKeyId,
        window_start: i64,
        limit: u32,
    ) -> Result<Option<u32>, DomainError> {
        // Single-statement upsert: the guarded DO UPDATE makes the
        // check-and-increment atomic, no row is ever pushed past the
        // limit by concurrent callers.
        let row = sqlx::query(
            r#"
            INSERT INTO rate_windows (key_id, window_start, request_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (key_id, window_start)
            DO UPDATE SET request_count = rate_windows.request_count + 1
            WHERE rate_windows.request_count < $3
            RETURNING request_count
            "#,
        )
        .bind(key_id.as_str())
        .bind(window_start)
        .bind(limit as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to bump rate counter: {}", e)))?;

        Ok(row.map(|r| r.get::<i32, _>("request_count") as u32))
    }

    async fn rate_counter_purge_before(&self, threshold: i64) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM rate_windows WHERE window_start < $1")
            .bind(threshold)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to purge rate windows: {}", e)))?;

        Ok(result.rows_affected())
    }
}
