//! Creation-config validation
//!
//! Rejects bad configuration before any randomness or store call.

use thiserror::Error;

use super::entity::KeySpec;

/// Errors in a key creation configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyConfigError {
    #[error("key length must be a positive integer")]
    NonPositiveLength,

    #[error("key length exceeds maximum of {0} characters")]
    LengthTooLarge(usize),

    #[error("rate limit must be a positive integer")]
    NonPositiveRateLimit,
}

const MAX_KEY_LENGTH: usize = 4096;

/// Validate the generation shape of a key
pub fn validate_key_spec(spec: &KeySpec) -> Result<(), KeyConfigError> {
    if spec.length == 0 {
        return Err(KeyConfigError::NonPositiveLength);
    }

    if spec.length > MAX_KEY_LENGTH {
        return Err(KeyConfigError::LengthTooLarge(MAX_KEY_LENGTH));
    }

    Ok(())
}

/// Validate an optional requests-per-minute cap
pub fn validate_rate_limit(rate_limit: Option<u32>) -> Result<(), KeyConfigError> {
    if rate_limit == Some(0) {
        return Err(KeyConfigError::NonPositiveRateLimit);
    }

    Ok(())
}
