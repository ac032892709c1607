//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod app;
pub mod error;
pub mod rue;
pub mod shared_secret;
pub mod storage;

pub use api_key::{
    ApiKeyId, ApiKeyRecord, ApiKeyRepository, InvalidReason, KeyCharset, KeyConfigError,
    KeyListFilter, KeySpec, KeyStats, ValidateOptions, ValidationOutcome,
};
pub use app::{App, AppId};
pub use error::DomainError;
pub use rue::{Rue, RueId};
pub use shared_secret::{SharedSecret, SharedSecretId};
pub use storage::{Storage, StorageEntity, StorageKey};
