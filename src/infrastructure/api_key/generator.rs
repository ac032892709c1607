//! API key generation
//!
//! Generates cryptographically secure API keys with hashing.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::api_key::KeySpec;

/// How many trailing characters of a raw key are kept for display
const SUFFIX_LEN: usize = 4;

/// Result of generating a new API key
///
/// The raw key is handed to the caller exactly once; only the hash and the
/// display fields are ever persisted.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    /// The full raw key (only shown once at creation)
    pub raw_key: String,
    /// SHA-256 hex digest of the full raw key
    pub key_hash: String,
    /// Trailing characters of the raw key, safe for display
    pub suffix: String,
}

/// Generator for secure API keys
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator;

impl KeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a new key from the given shape.
    ///
    /// Each random character is drawn by reducing one byte from the OS
    /// RNG modulo the alphabet size. Alphabet sizes that do not divide
    /// 256 carry a small modulo bias, which is accepted for this use.
    pub fn generate(&self, spec: &KeySpec) -> GeneratedKey {
        let alphabet = spec.charset.alphabet();

        let mut random_bytes = vec![0u8; spec.length];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let body: String = random_bytes
            .iter()
            .map(|b| alphabet[*b as usize % alphabet.len()] as char)
            .collect();

        let raw_key = format!("{}{}", spec.prefix, body);

        GeneratedKey {
            key_hash: self.hash_key(&raw_key),
            suffix: key_suffix(&raw_key).to_string(),
            raw_key,
        }
    }

    /// Build a key from a known body (for deterministic tests)
    pub fn from_body(&self, spec: &KeySpec, body: &str) -> GeneratedKey {
        let raw_key = format!("{}{}", spec.prefix, body);

        GeneratedKey {
            key_hash: self.hash_key(&raw_key),
            suffix: key_suffix(&raw_key).to_string(),
            raw_key,
        }
    }

    /// Hash a raw key for storage or lookup
    pub fn hash_key(&self, raw_key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw_key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify a raw key against a stored hash
    pub fn verify_key(&self, raw_key: &str, stored_hash: &str) -> bool {
        constant_time_compare(&self.hash_key(raw_key), stored_hash)
    }
}

/// The display suffix of a raw key: its last four characters, or the whole
/// key when it is shorter than that.
pub fn key_suffix(raw_key: &str) -> &str {
    let chars = raw_key.chars().count();
    match raw_key.char_indices().nth(chars.saturating_sub(SUFFIX_LEN)) {
        Some((idx, _)) => &raw_key[idx..],
        None => raw_key,
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut result = 0u8;

    for i in 0..a.len() {
        result |= a_bytes[i] ^ b_bytes[i];
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::KeyCharset;

    #[test]
    fn test_generate_key_shape() {
        let spec = KeySpec::default();
        let generated = KeyGenerator::new().generate(&spec);

        assert!(generated.raw_key.starts_with("rapids_"));
        assert_eq!(generated.raw_key.len(), "rapids_".len() + 32);
        // Hex SHA-256 digest
        assert_eq!(generated.key_hash.len(), 64);
        assert!(generated.key_hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_body_respects_charset() {
        let generator = KeyGenerator::new();

        for charset in [
            KeyCharset::Alphanumeric,
            KeyCharset::AlphanumericLower,
            KeyCharset::AlphanumericUpper,
            KeyCharset::Hex,
            KeyCharset::Base64Url,
        ] {
            let spec = KeySpec::new("", 256, charset);
            let generated = generator.generate(&spec);

            assert!(
                generated.raw_key.chars().all(|c| charset.contains(c)),
                "charset {:?} produced out-of-alphabet character",
                charset
            );
        }
    }

    #[test]
    fn test_key_uniqueness() {
        let spec = KeySpec::default();
        let generator = KeyGenerator::new();

        let key1 = generator.generate(&spec);
        let key2 = generator.generate(&spec);

        assert_ne!(key1.raw_key, key2.raw_key);
        assert_ne!(key1.key_hash, key2.key_hash);
    }

    #[test]
    fn test_hash_deterministic_and_known() {
        let generator = KeyGenerator::new();

        assert_eq!(generator.hash_key("abc"), generator.hash_key("abc"));
        // SHA-256("abc"), lowercase hex
        assert_eq!(
            generator.hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_key() {
        let generator = KeyGenerator::new();
        let generated = generator.generate(&KeySpec::default());

        assert!(generator.verify_key(&generated.raw_key, &generated.key_hash));
        assert!(!generator.verify_key("wrong_key", &generated.key_hash));
    }

    #[test]
    fn test_suffix_is_last_four_chars() {
        assert_eq!(key_suffix("rapids_abcdwxyz"), "wxyz");
        assert_eq!(key_suffix("abcd"), "abcd");
    }

    #[test]
    fn test_suffix_of_short_key_is_whole_key() {
        assert_eq!(key_suffix("ab"), "ab");
        assert_eq!(key_suffix(""), "");
    }

    #[test]
    fn test_from_body_is_deterministic() {
        let generator = KeyGenerator::new();
        let spec = KeySpec::new("sk_", 8, KeyCharset::Hex);

        let a = generator.from_body(&spec, "deadbeef");
        let b = generator.from_body(&spec, "deadbeef");

        assert_eq!(a.raw_key, "sk_deadbeef");
        assert_eq!(a.key_hash, b.key_hash);
        assert_eq!(a.suffix, "beef");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
