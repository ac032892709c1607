//! PostgreSQL storage for the auxiliary entity tables

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Connection settings for the shared pool
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/rapids_keys".to_string(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Open a connection pool against this configuration
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| storage_err("connect", e))
    }
}

fn storage_err(op: &str, e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("postgres {op} failed: {e}"))
}

/// JSONB-backed table for one [`StorageEntity`] type.
///
/// Each entity type gets its own (key, data) table; the payload is the
/// serialized entity, the key column exists for lookups and uniqueness.
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table: String,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table", &self.table)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            _phantom: PhantomData,
        }
    }

    /// Creates the backing table if it does not exist.
    /// Called explicitly once at startup, never lazily per request.
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("create table", e))?;

        Ok(())
    }

    fn decode(row: &PgRow) -> Result<E, DomainError> {
        let data: serde_json::Value = row.get("data");
        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("corrupt entity payload: {e}")))
    }

    fn encode(entity: &E) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(entity)
            .map_err(|e| DomainError::storage(format!("unserializable entity: {e}")))
    }
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let sql = format!("SELECT data FROM {} WHERE key = $1", self.table);

        let row = sqlx::query(&sql)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("get", e))?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let sql = format!("SELECT data FROM {} ORDER BY created_at", self.table);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_err("list", e))?;

        rows.iter().map(Self::decode).collect()
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let data = Self::encode(&entity)?;
        let sql = format!(
            "INSERT INTO {} (key, data) VALUES ($1, $2)",
            self.table
        );

        sqlx::query(&sql)
            .bind(entity.key().as_str())
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    DomainError::conflict(format!(
                        "entity '{}' already exists",
                        entity.key().as_str()
                    ))
                } else {
                    storage_err("create", e)
                }
            })?;

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let data = Self::encode(&entity)?;
        let sql = format!(
            "UPDATE {} SET data = $2, updated_at = NOW() WHERE key = $1",
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(entity.key().as_str())
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("update", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "entity '{}' not found",
                entity.key().as_str()
            )));
        }

        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let sql = format!("DELETE FROM {} WHERE key = $1", self.table);

        let result = sqlx::query(&sql)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("delete", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE key = $1) AS present",
            self.table
        );

        let row = sqlx::query(&sql)
            .bind(key.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_err("exists", e))?;

        Ok(row.get::<bool, _>("present"))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", self.table);

        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_err("count", e))?;

        Ok(row.get::<i64, _>("total") as usize)
    }
}
