//! In-memory signer directory

use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::outbound::SignerDirectory;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::SignerKey;
use std::collections::HashMap;

/// Email to signer key mapping. Emails compare case-insensitively.
#[derive(Default)]
pub struct InMemorySignerDirectory {
    entries: RwLock<HashMap<String, SignerKey>>,
}

impl InMemorySignerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(email: &str) -> String {
        email.trim().to_ascii_lowercase()
    }

    pub fn register(&self, email: &str, key: SignerKey) {
        self.entries.write().insert(Self::normalize(email), key);
    }

    #[must_use]
    pub fn with_entry(self, email: &str, key: SignerKey) -> Self {
        self.register(email, key);
        self
    }
}

#[async_trait]
impl SignerDirectory for InMemorySignerDirectory {
    async fn resolve(&self, email: &str) -> LifecycleResult<SignerKey> {
        let normalized = Self::normalize(email);
        if normalized.is_empty() {
            return Err(LifecycleError::invalid("email must not be empty"));
        }
        self.entries
            .read()
            .get(&normalized)
            .cloned()
            .ok_or_else(|| LifecycleError::NotFound {
                what: format!("signer for {normalized}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_is_case_insensitive() {
        let dir = InMemorySignerDirectory::new().with_entry("Ada@Example.com", SignerKey::new("k1"));
        assert_eq!(dir.resolve(" ada@example.com ").await.unwrap(), SignerKey::new("k1"));
    }

    #[tokio::test]
    async fn test_unknown_and_blank_email() {
        let dir = InMemorySignerDirectory::new();
        assert!(matches!(
            dir.resolve("nobody@example.com").await,
            Err(LifecycleError::NotFound { .. })
        ));
        assert!(matches!(
            dir.resolve("  ").await,
            Err(LifecycleError::InvalidInput { .. })
        ));
    }
}
