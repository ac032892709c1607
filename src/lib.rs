//! Rapids Keys
//!
//! API key issuance, validation and rate limiting service:
//! - Configurable key shape (prefix, length, charset), hash-before-store
//! - Fixed per-minute rate windows enforced in the backing store
//! - Revocation, expiry, metadata and scope management
//! - Memory and PostgreSQL backends

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use tracing::info;

use crate::api::state::AppState;
use crate::config::StorageBackend;
use crate::domain::api_key::KeySpec;
use crate::domain::app::App;
use crate::domain::rue::Rue;
use crate::domain::shared_secret::SharedSecret;
use crate::infrastructure::api_key::{ApiKeyService, InMemoryApiKeyRepository, PgApiKeyRepository};
use crate::infrastructure::services::{AppService, RueService, SharedSecretService};
use crate::infrastructure::storage::{InMemoryStorage, PostgresConfig, PostgresStorage};

/// Create the application state for the configured backend.
///
/// Storage is constructed, and its schema ensured, exactly once here;
/// nothing downstream initializes tables lazily.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let default_spec = KeySpec::new(
        config.keys.prefix.clone(),
        config.keys.length,
        config.keys.charset,
    );

    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage backend");

            let repository = Arc::new(InMemoryApiKeyRepository::new());

            Ok(AppState {
                api_key_service: Arc::new(
                    ApiKeyService::new(repository).with_default_spec(default_spec),
                ),
                app_service: Arc::new(AppService::new(Arc::new(
                    InMemoryStorage::<App>::new(),
                ))),
                shared_secret_service: Arc::new(SharedSecretService::new(Arc::new(
                    InMemoryStorage::<SharedSecret>::new(),
                ))),
                rue_service: Arc::new(RueService::new(Arc::new(InMemoryStorage::<Rue>::new()))),
            })
        }
        StorageBackend::Postgres => {
            info!("Using PostgreSQL storage backend");

            let pool = PostgresConfig::new(config.storage.url.clone())
                .with_max_connections(config.storage.max_connections)
                .connect()
                .await?;

            let repository = PgApiKeyRepository::new(pool.clone());
            repository.ensure_schema().await?;

            let app_storage = PostgresStorage::<App>::new(pool.clone(), "apps");
            app_storage.ensure_table().await?;

            let secret_storage = PostgresStorage::<SharedSecret>::new(pool.clone(), "shared_secrets");
            secret_storage.ensure_table().await?;

            let rue_storage = PostgresStorage::<Rue>::new(pool, "rues");
            rue_storage.ensure_table().await?;

            Ok(AppState {
                api_key_service: Arc::new(
                    ApiKeyService::new(Arc::new(repository)).with_default_spec(default_spec),
                ),
                app_service: Arc::new(AppService::new(Arc::new(app_storage))),
                shared_secret_service: Arc::new(SharedSecretService::new(Arc::new(
                    secret_storage,
                ))),
                rue_service: Arc::new(RueService::new(Arc::new(rue_storage))),
            })
        }
    }
}
