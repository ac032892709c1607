//! Shared secret entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};

/// Shared secret identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedSecretId(String);

impl SharedSecretId {
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

impl std::fmt::Display for SharedSecretId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for SharedSecretId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// An opaque shared secret held for out-of-band integrations.
/// The secret value is never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSecret {
    id: SharedSecretId,
    secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SharedSecret {
    pub fn new(id: SharedSecretId, secret: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            secret: secret.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &SharedSecretId {
        &self.id
    }

    pub fn secret(&self) -> &str {
        &self.secret
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

    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = secret.into();
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

impl StorageEntity for SharedSecret {
    type Key = SharedSecretId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
