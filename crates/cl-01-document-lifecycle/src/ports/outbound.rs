//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{Contract, Document, DocumentStatus, Revision};
use crate::error::LifecycleResult;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{ContractKey, DocumentKey, SignerKey, Timestamp};

/// Selection criteria for document listings
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentQuery {
    /// Documents uploaded by the signer.
    OwnedBy(SignerKey),
    /// Documents where the signer is required, optionally in one status.
    ExpectedFrom {
        signer: SignerKey,
        status: Option<DocumentStatus>,
    },
    /// Documents the signer successfully signed.
    SignedBy(SignerKey),
}

impl DocumentQuery {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::OwnedBy(owner) => &doc.owner == owner,
            Self::ExpectedFrom { signer, status } => {
                doc.is_required(signer) && status.map_or(true, |s| doc.status == s)
            }
            Self::SignedBy(signer) => doc.has_signed(signer),
        }
    }
}

/// Document persistence with optimistic concurrency
///
/// `put` is a compare-and-swap: the stored version must equal
/// `doc.version` (0 for a document never stored). On success the returned
/// document carries the incremented version and one `Revision` is appended.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &DocumentKey) -> LifecycleResult<Document>;

    /// Fails with `Conflict` when `doc.version` is stale.
    async fn put(&self, doc: Document) -> LifecycleResult<Document>;

    /// Committed revisions, ordered by version.
    async fn history(&self, key: &DocumentKey) -> LifecycleResult<Vec<Revision>>;

    /// `Waiting` documents with `timeout <= now`.
    async fn expired(&self, now: Timestamp) -> LifecycleResult<Vec<Document>>;

    async fn find(&self, query: DocumentQuery) -> LifecycleResult<Vec<Document>>;
}

/// Contract persistence, same compare-and-swap contract as `DocumentStore`
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn get(&self, key: &ContractKey) -> LifecycleResult<Contract>;

    async fn put(&self, contract: Contract) -> LifecycleResult<Contract>;

    /// Every contract still `Active`.
    async fn active(&self) -> LifecycleResult<Vec<Contract>>;

    /// Contracts owned by or involving the signer.
    async fn involving(&self, signer: &SignerKey) -> LifecycleResult<Vec<Contract>>;
}

/// Resolves a human-facing email to a stable signer key
///
/// Fails with `NotFound` for unknown emails.
#[async_trait]
pub trait SignerDirectory: Send + Sync {
    async fn resolve(&self, email: &str) -> LifecycleResult<SignerKey>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually advanced clock.
#[derive(Debug)]
pub struct MockTimeSource {
    now: RwLock<Timestamp>,
}

impl MockTimeSource {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.write() += by;
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}
