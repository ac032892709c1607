//! Named mapping ("rue") entity
//!
//! A rue is an opaque name-to-value row used to carry per-deployment
//! routing and lookup mappings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};

/// Rue identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RueId(String);

impl RueId {
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

impl std::fmt::Display for RueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for RueId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// A named mapping entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rue {
    id: RueId,
    name: String,
    value: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Rue {
    pub fn new(id: RueId, name: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &RueId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for Rue {
    type Key = RueId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rue_creation() {
        let rue = Rue::new(RueId::new("r-1"), "default-region", "us-east-1");

        assert_eq!(rue.id().as_str(), "r-1");
        assert_eq!(rue.name(), "default-region");
        assert_eq!(rue.value(), "us-east-1");
    }

    #[test]
    fn test_rue_set_value() {
        let mut rue = Rue::new(RueId::generate(), "default-region", "us-east-1");

        std::thread::sleep(std::time::Duration::from_millis(10));
        rue.set_value("eu-west-1");

        assert_eq!(rue.value(), "eu-west-1");
        assert!(rue.updated_at() > rue.created_at());
    }
}
