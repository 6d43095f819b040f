//! # Core Identifiers
//!
//! Defines the identifiers shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Parties**: `SignerKey` (directory-resolved, distinct from email)
//! - **Aggregates**: `DocumentKey`, `ContractKey`
//! - **Artifacts**: `ContentHash`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// UTC wall-clock instant used for deadlines and store timestamps.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// =============================================================================
// CLUSTER A: PARTIES
// =============================================================================

/// Stable ledger identifier for a party, as resolved by the signer directory.
///
/// Notifications and connections are keyed by this value, never by email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerKey(String);

impl SignerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignerKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Recipient of notifications and owner of live connections.
pub type UserId = SignerKey;

// =============================================================================
// CLUSTER B: AGGREGATES
// =============================================================================

/// Unique, immutable identifier of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(pub Uuid);

impl DocumentKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document:{}", self.0)
    }
}

/// Unique, immutable identifier of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractKey(pub Uuid);

impl ContractKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract:{}", self.0)
    }
}

// =============================================================================
// CLUSTER C: ARTIFACTS
// =============================================================================

/// Hex-encoded SHA-256 digest of an artifact (unsigned or signed PDF).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an existing hex digest.
    pub fn new(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    /// Digest raw artifact bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
