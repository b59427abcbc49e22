//! SHA-256 content hash used for upstream change detection
//!
//! The hash is stored as its raw 32-byte digest rather than a hex string, so
//! comparing the current payload against the cached one is a plain byte
//! comparison. It serializes transparently as a lowercase hex string, which is
//! the `contentHash` field of the wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{PersistenceError, PersistenceResult};

/// SHA-256 digest of a raw feed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a raw payload
    ///
    /// # Examples
    ///
    /// ```rust
    /// use signs::app::ContentHash;
    ///
    /// let hash = ContentHash::of(b"abc");
    /// assert_eq!(
    ///     hash.to_hex(),
    ///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    /// );
    /// ```
    pub fn of(content: &[u8]) -> Self {
        ContentHash(Sha256::digest(content).into())
    }

    /// Create a hash from its hex representation (case insensitive)
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::InvalidHash` unless the input is exactly 64
    /// hexadecimal characters.
    pub fn from_hex(hex_str: &str) -> PersistenceResult<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes).map_err(|_| PersistenceError::InvalidHash {
            hash: hex_str.to_string(),
        })?;
        Ok(ContentHash(bytes))
    }

    /// Lowercase 64-character hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        Self::from_hex(&hex_string).map_err(serde::de::Error::custom)
    }
}
