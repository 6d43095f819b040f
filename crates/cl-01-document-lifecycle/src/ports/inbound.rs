//! Driving Ports (API - Inbound)

use crate::domain::{Clause, Contract, Document, DocumentStatus, Revision};
use crate::error::LifecycleResult;
use async_trait::async_trait;
use shared_types::{ContentHash, ContractKey, DocumentKey, SignerKey, Timestamp};

/// Upload request for a new document
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub owner: SignerKey,
    pub name: String,
    pub required_signers: Vec<SignerKey>,
    pub artifact_hash: ContentHash,
    pub timeout: Timestamp,
}

/// Primary Document Lifecycle API
///
/// This is the driving port for document signatures. Every mutating
/// operation persists with compare-and-swap and then emits notifications.
#[async_trait]
pub trait DocumentLifecycleApi: Send + Sync {
    /// Create a `Waiting` document.
    async fn upload(&self, request: UploadRequest) -> LifecycleResult<Document>;

    /// Record a signature and finalize when complete.
    ///
    /// # Errors
    /// * `NotEligible` - signer is not required (checked first)
    /// * `AlreadySigned` / `AlreadyRejected` - signer already acted
    /// * `NotSignable` - document is not `Waiting`
    /// * `Conflict` - lost a concurrent update; retry with fresh state
    async fn sign(
        &self,
        key: DocumentKey,
        signer: SignerKey,
        signed_hash: ContentHash,
    ) -> LifecycleResult<Document>;

    /// Record a rejection; status is unchanged.
    async fn reject(&self, key: DocumentKey, signer: SignerKey) -> LifecycleResult<Document>;

    /// Owner-only cancellation.
    async fn cancel(
        &self,
        key: DocumentKey,
        requester: SignerKey,
        force: bool,
    ) -> LifecycleResult<Document>;

    /// Expire every overdue `Waiting` document. Returns those that changed.
    async fn sweep_expired(&self, now: Timestamp) -> LifecycleResult<Vec<Document>>;

    /// Owner-only rename and/or reschedule.
    async fn rename_or_reschedule(
        &self,
        key: DocumentKey,
        requester: SignerKey,
        new_name: Option<String>,
        new_timeout: Option<Timestamp>,
    ) -> LifecycleResult<Document>;

    async fn get_document(&self, key: DocumentKey) -> LifecycleResult<Document>;

    async fn document_history(&self, key: DocumentKey) -> LifecycleResult<Vec<Revision>>;

    async fn documents_owned_by(&self, owner: SignerKey) -> LifecycleResult<Vec<Document>>;

    async fn expected_signatures(
        &self,
        signer: SignerKey,
        status: Option<DocumentStatus>,
    ) -> LifecycleResult<Vec<Document>>;

    /// `Waiting` documents the signer has neither signed nor rejected.
    async fn pending_signatures(&self, signer: SignerKey) -> LifecycleResult<Vec<Document>>;

    async fn successful_signatures(&self, signer: SignerKey) -> LifecycleResult<Vec<Document>>;

    async fn resolve_signer(&self, email: &str) -> LifecycleResult<SignerKey>;
}

/// Contract Lifecycle API
#[async_trait]
pub trait ContractLifecycleApi: Send + Sync {
    async fn create_contract(
        &self,
        owner: SignerKey,
        name: String,
        participants: Vec<SignerKey>,
    ) -> LifecycleResult<Contract>;

    async fn add_clause(
        &self,
        key: ContractKey,
        requester: SignerKey,
        clause: Clause,
    ) -> LifecycleResult<Contract>;

    async fn add_participant(
        &self,
        key: ContractKey,
        requester: SignerKey,
        participant: SignerKey,
    ) -> LifecycleResult<Contract>;

    async fn cancel_contract(
        &self,
        key: ContractKey,
        requester: SignerKey,
        force: bool,
    ) -> LifecycleResult<Contract>;

    /// Execute due clauses across every `Active` contract.
    ///
    /// Returns the contracts that changed.
    async fn execute_due_contracts(&self, now: Timestamp) -> LifecycleResult<Vec<Contract>>;

    async fn get_contract(&self, key: ContractKey) -> LifecycleResult<Contract>;

    async fn contracts_involving(&self, signer: SignerKey) -> LifecycleResult<Vec<Contract>>;
}
