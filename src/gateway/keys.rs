//! Gateway API keys.
//!
//! Keys are opaque random tokens. Only their SHA-256 hashes are kept in
//! memory; the first 8 hex characters of the hash identify a key in logs
//! and usage rows.

use std::collections::HashSet;
use std::sync::RwLock;

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::MusicError;

/// Prefix of issued keys.
pub const KEY_PREFIX: &str = "mm_";

const KEY_RANDOM_BYTES: usize = 16;
const FINGERPRINT_CHARS: usize = 8;

/// Fingerprint recorded for requests made without a key.
pub const ANONYMOUS_FINGERPRINT: &str = "anonymous";

/// Returns the hex SHA-256 hash of a key.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Returns the short identifier of a key.
pub fn fingerprint(key: &str) -> String {
    hash_key(key)[..FINGERPRINT_CHARS].to_string()
}

/// Set of accepted key hashes.
#[derive(Debug, Default)]
pub struct ApiKeyRegistry {
    hashes: RwLock<HashSet<String>>,
}

impl ApiKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry accepting the given plaintext keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for key in keys {
            registry.register(key.as_ref());
        }
        registry
    }

    /// Generates a new key (`mm_` + 32 hex chars) and registers it.
    pub fn issue(&self) -> String {
        let key = generate_key();
        self.register(&key);
        key
    }

    pub fn register(&self, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        self.hashes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(hash_key(key));
    }

    pub fn len(&self) -> usize {
        self.hashes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true when no keys are configured and every request is allowed.
    pub fn is_open(&self) -> bool {
        self.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.hashes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&hash_key(key.trim()))
    }

    /// Checks the key sent with a request and returns its fingerprint.
    ///
    /// An open registry accepts any request. A supplied key is still
    /// fingerprinted so usage rows can tell callers apart.
    pub fn authorize(&self, supplied: Option<&str>) -> Result<String, MusicError> {
        let supplied = supplied.map(str::trim).filter(|k| !k.is_empty());

        if self.is_open() {
            return Ok(supplied
                .map(fingerprint)
                .unwrap_or_else(|| ANONYMOUS_FINGERPRINT.to_string()));
        }

        match supplied {
            None => Err(MusicError::missing_api_key()),
            Some(key) if self.contains(key) => Ok(fingerprint(key)),
            Some(_) => Err(MusicError::invalid_api_key()),
        }
    }
}

/// Generates a new random key without registering it.
fn generate_key() -> String {
    let mut bytes = [0u8; KEY_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", KEY_PREFIX, hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn issued_key_shape() {
        let registry = ApiKeyRegistry::new();
        let key = registry.issue();
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + 32);
        assert!(key[KEY_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(registry.contains(&key));
        assert_ne!(key, registry.issue());
    }

    #[test]
    fn hash_is_not_plaintext() {
        let registry = ApiKeyRegistry::from_keys(["secret-key"]);
        let hashes = registry.hashes.read().unwrap();
        assert!(!hashes.contains("secret-key"));
        assert!(hashes.contains(&hash_key("secret-key")));
    }

    #[test]
    fn fingerprint_is_hash_prefix() {
        let fp = fingerprint("abc");
        assert_eq!(fp.len(), 8);
        assert!(hash_key("abc").starts_with(&fp));
    }

    #[test]
    fn open_registry_allows_everything() {
        let registry = ApiKeyRegistry::new();
        assert!(registry.is_open());
        assert_eq!(registry.authorize(None).unwrap(), ANONYMOUS_FINGERPRINT);
        assert_eq!(registry.authorize(Some("k")).unwrap(), fingerprint("k"));
    }

    #[test]
    fn closed_registry_checks_keys() {
        let registry = ApiKeyRegistry::from_keys(["good", " "]);
        assert_eq!(registry.len(), 1);

        assert_eq!(
            registry.authorize(None).unwrap_err().code,
            ErrorCode::MissingApiKey
        );
        assert_eq!(
            registry.authorize(Some("  ")).unwrap_err().code,
            ErrorCode::MissingApiKey
        );
        assert_eq!(
            registry.authorize(Some("bad")).unwrap_err().code,
            ErrorCode::InvalidApiKey
        );
        assert_eq!(registry.authorize(Some(" good ")).unwrap(), fingerprint("good"));
    }

    #[test]
    fn issued_key_joins_configured_keys() {
        let configured = vec!["a".to_string(), "b".to_string()];
        let registry = ApiKeyRegistry::from_keys(&configured);
        let key = registry.issue();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("a"));
        assert_eq!(registry.authorize(Some(&key)).unwrap(), fingerprint(&key));
    }
}
