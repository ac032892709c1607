//! Application service - CRUD over registered applications

use std::sync::Arc;

use tracing::info;

use crate::domain::app::{App, AppId};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Service for managing registered applications
pub struct AppService {
    storage: Arc<dyn Storage<App>>,
}

impl AppService {
    pub fn new(storage: Arc<dyn Storage<App>>) -> Self {
        Self { storage }
    }

    /// Register a new application with a generated id
    pub async fn create(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<App, DomainError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("application name must not be empty"));
        }

        let mut app = App::new(AppId::generate(), name);
        if let Some(description) = description {
            app = app.with_description(description);
        }

        let app = self.storage.create(app).await?;
        info!(app_id = %app.id(), "application registered");

        Ok(app)
    }

    /// Create or replace an application under a known id
    pub async fn upsert(&self, app: App) -> Result<App, DomainError> {
        self.storage.save(app).await
    }

    pub async fn get(&self, id: &AppId) -> Result<Option<App>, DomainError> {
        self.storage.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<App>, DomainError> {
        self.storage.list().await
    }

    pub async fn delete(&self, id: &AppId) -> Result<bool, DomainError> {
        let deleted = self.storage.delete(id).await?;

        if deleted {
            info!(app_id = %id, "application deleted");
        }

        Ok(deleted)
    }
}
