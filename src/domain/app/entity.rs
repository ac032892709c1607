//! Registered application entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};

/// Application identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for AppId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// A registered application that consumes issued keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    id: AppId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl App {
    pub fn new(id: AppId, name: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &AppId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for App {
    type Key = AppId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_creation() {
        let app = App::new(AppId::new("app-1"), "Billing");

        assert_eq!(app.id().as_str(), "app-1");
        assert_eq!(app.name(), "Billing");
        assert!(app.description().is_none());
        assert_eq!(app.created_at(), app.updated_at());
    }

    #[test]
    fn test_app_with_description() {
        let app = App::new(AppId::generate(), "Billing").with_description("Billing backend");
        assert_eq!(app.description(), Some("Billing backend"));
    }

    #[test]
    fn test_app_mutation_touches_updated_at() {
        let mut app = App::new(AppId::new("app-1"), "Billing");
        let before = app.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(10));
        app.set_name("Invoicing");

        assert_eq!(app.name(), "Invoicing");
        assert!(app.updated_at() > before);
    }
}
