//! API key domain
//!
//! Domain types and traits for API key management: key shape, lifecycle
//! state, validation outcomes and the repository contract.

mod entity;
mod repository;
mod validation;

pub use entity::{
    ApiKeyId, ApiKeyRecord, InvalidReason, KeyCharset, KeyListFilter, KeySpec, KeyStats,
    ValidateOptions, ValidationOutcome,
};
pub use repository::ApiKeyRepository;
pub use validation::{validate_key_spec, validate_rate_limit, KeyConfigError};
