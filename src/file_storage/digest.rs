//! # Content Digests
//!
//! SHA-256 over the raw object bytes, rendered as 64 lowercase hex characters.
//! The digest is the object's identity: identical bytes always map to the same
//! digest, and therefore to the same storage slot.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::errors::{StorageError, StorageResult};

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// A validated content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Compute the digest of `data`
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a digest supplied by a client.
    ///
    /// Uppercase hex is accepted and normalized to lowercase.
    pub fn parse(input: &str) -> StorageResult<Self> {
        if input.is_empty() {
            return Err(StorageError::InvalidDigest("empty digest".to_string()));
        }
        if !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest(format!(
                "non-hex characters in {:?}",
                input
            )));
        }
        if input.len() != DIGEST_HEX_LEN {
            return Err(StorageError::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                DIGEST_HEX_LEN,
                input.len()
            )));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    /// Two-character shard prefix
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = StorageError;

    fn try_from(value: String) -> StorageResult<Self> {
        Digest::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}
