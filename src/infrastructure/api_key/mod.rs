//! API key infrastructure
//!
//! Key generation, the store-backed rate limiter, the service facade
//! and the repository implementations.

mod generator;
mod postgres_repository;
mod rate_limiter;
mod repository;
mod service;

pub use generator::{key_suffix, GeneratedKey, KeyGenerator};
pub use postgres_repository::PgApiKeyRepository;
pub use rate_limiter::{window_start, RateLimiter, WINDOW_MILLIS};
pub use repository::InMemoryApiKeyRepository;
pub use service::{ApiKeyService, CreateKeyParams, CreatedKey};
