//! API key record and related types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API key identifier - opaque, generated at creation, immutable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(String);

impl ApiKeyId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Character set used for the random body of a generated key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyCharset {
    /// A-Z, a-z, 0-9
    Alphanumeric,
    /// a-z, 0-9
    AlphanumericLower,
    /// A-Z, 0-9
    AlphanumericUpper,
    /// 0-9, a-f
    Hex,
    /// A-Z, a-z, 0-9, -, _
    #[default]
    #[serde(rename = "base64url")]
    Base64Url,
}

impl KeyCharset {
    /// The alphabet characters are drawn from
    pub fn alphabet(&self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => {
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789"
            }
            Self::AlphanumericLower => b"abcdefghijklmnopqrstuvwxyz0123456789",
            Self::AlphanumericUpper => b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
            Self::Hex => b"0123456789abcdef",
            Self::Base64Url => {
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_"
            }
        }
    }

    /// Check whether a character belongs to this charset's alphabet
    pub fn contains(&self, c: char) -> bool {
        c.is_ascii() && self.alphabet().contains(&(c as u8))
    }
}

/// Shape of a key to generate: prefix, random body length and charset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Literal prefix prepended to the random body
    pub prefix: String,
    /// Number of random characters (excluding the prefix)
    pub length: usize,
    /// Alphabet the random body is drawn from
    pub charset: KeyCharset,
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            prefix: "rapids_".to_string(),
            length: 32,
            charset: KeyCharset::default(),
        }
    }
}

impl KeySpec {
    pub fn new(prefix: impl Into<String>, length: usize, charset: KeyCharset) -> Self {
        Self {
            prefix: prefix.into(),
            length,
            charset,
        }
    }
}

/// API key record as held by the store
///
/// The raw key itself is never part of this record; only its hash is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Unique identifier
    id: ApiKeyId,
    /// SHA-256 hex digest of the full raw key
    key_hash: String,
    /// Display prefix (the literal key prefix)
    prefix: String,
    /// Last 4 characters of the raw key, safe for display
    suffix: String,
    /// Optional human label
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Absolute expiry (None = never expires)
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    /// Last successful validation, when the caller opted in
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    /// False once revoked; revocation is one-way
    is_active: bool,
    /// Opaque string-keyed metadata, replaced wholesale on update
    #[serde(default)]
    metadata: HashMap<String, String>,
    /// Ordered permission scopes, replaced wholesale on update
    #[serde(default)]
    scopes: Vec<String>,
    /// Requests-per-minute cap (None = unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit: Option<u32>,
}

impl ApiKeyRecord {
    /// Create a new active record
    pub fn new(
        id: ApiKeyId,
        key_hash: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            id,
            key_hash: key_hash.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            name: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
            is_active: true,
            metadata: HashMap::new(),
            scopes: Vec::new(),
            rate_limit: None,
        }
    }

    /// Set the label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the expiry timestamp
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the metadata map
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the permission scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the requests-per-minute cap
    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn rate_limit(&self) -> Option<u32> {
        self.rate_limit
    }

    // Status checks

    /// Whether the expiry has passed at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    // Mutators

    /// Replace the label
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Replace the whole metadata map (no merge)
    pub fn set_metadata(&mut self, metadata: HashMap<String, String>) {
        self.metadata = metadata;
    }

    /// Replace the whole scope list (no merge)
    pub fn set_scopes(&mut self, scopes: Vec<String>) {
        self.scopes = scopes;
    }

    /// Revoke the key; there is no way back to active
    pub fn revoke(&mut self) {
        self.is_active = false;
    }

    /// Record a successful validation
    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }
}

/// Why a key failed validation
///
/// These codes are a stable contract: the transport layer maps them to
/// protocol status signaling (401 vs 429).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    NotFound,
    Revoked,
    Expired,
    RateLimited,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Revoked => write!(f, "revoked"),
            Self::Expired => write!(f, "expired"),
            Self::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Structured result of a validation call
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Whether the key may be used
    pub valid: bool,
    /// Set exactly when `valid` is false
    pub reason: Option<InvalidReason>,
    /// The matching record, when one exists (absent for `not_found`)
    pub key: Option<ApiKeyRecord>,
}

impl ValidationOutcome {
    /// Successful validation
    pub fn valid(key: ApiKeyRecord) -> Self {
        Self {
            valid: true,
            reason: None,
            key: Some(key),
        }
    }

    /// No record matched the presented key
    pub fn not_found() -> Self {
        Self {
            valid: false,
            reason: Some(InvalidReason::NotFound),
            key: None,
        }
    }

    /// A record matched but the key may not be used
    pub fn rejected(reason: InvalidReason, key: ApiKeyRecord) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            key: Some(key),
        }
    }
}

/// Options for a validation call
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Persist `last_used_at` on success
    pub update_last_used: bool,
    /// Consult the rate limiter when the key carries a cap
    pub check_rate_limit: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            update_last_used: true,
            check_rate_limit: true,
        }
    }
}

/// Filter and pagination for key listings
#[derive(Debug, Clone, Default)]
pub struct KeyListFilter {
    /// Match on the stored active flag
    pub is_active: Option<bool>,
    /// Exact match on the display prefix
    pub prefix: Option<String>,
    /// When false (default), expired records are excluded regardless of
    /// their active flag
    pub include_expired: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl KeyListFilter {
    pub fn with_is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_include_expired(mut self, include_expired: bool) -> Self {
        self.include_expired = include_expired;
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

/// Aggregate key counts
///
/// Buckets come from independent counts: a key that is both revoked and
/// expired appears in both `expired` and `revoked`, so the buckets need
/// not sum to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub revoked: usize,
}
