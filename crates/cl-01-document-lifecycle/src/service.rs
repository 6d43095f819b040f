//! Lifecycle Service - Core business logic
//!
//! Every mutation follows the same shape: load the current snapshot, apply
//! the domain transition, commit with compare-and-swap, then emit
//! notifications. Notification failures after a commit are logged and
//! never undo or fail the committed change.

use crate::domain::{notices, Clause, Contract, Document, DocumentStatus, Revision};
use crate::error::{LifecycleError, LifecycleResult};
use crate::metrics;
use crate::ports::inbound::{ContractLifecycleApi, DocumentLifecycleApi, UploadRequest};
use crate::ports::outbound::{
    ContractStore, DocumentQuery, DocumentStore, SignerDirectory, SystemTimeSource, TimeSource,
};
use async_trait::async_trait;
use shared_bus::NotificationStore;
use shared_types::{
    ContentHash, ContractKey, DocumentKey, NewNotification, SignerKey, Timestamp,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle Service implementation
pub struct LifecycleService<D, C, N>
where
    D: DocumentStore,
    C: ContractStore,
    N: NotificationStore,
{
    documents: Arc<D>,
    contracts: Arc<C>,
    notifications: Arc<N>,
    directory: Arc<dyn SignerDirectory>,
    clock: Arc<dyn TimeSource>,
}

impl<D, C, N> LifecycleService<D, C, N>
where
    D: DocumentStore,
    C: ContractStore,
    N: NotificationStore,
{
    pub fn new(
        documents: Arc<D>,
        contracts: Arc<C>,
        notifications: Arc<N>,
        directory: Arc<dyn SignerDirectory>,
    ) -> Self {
        Self {
            documents,
            contracts,
            notifications,
            directory,
            clock: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the clock used for `createdAt`/`updatedAt` and sign checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    fn owner_check(is_owner: bool, requester: &SignerKey) -> LifecycleResult<()> {
        if !is_owner {
            return Err(LifecycleError::NotOwner {
                requester: requester.to_string(),
            });
        }
        Ok(())
    }

    async fn commit_document(&self, doc: Document, event: &str) -> LifecycleResult<Document> {
        match self.documents.put(doc).await {
            Ok(stored) => {
                metrics::record_transition("document", event);
                Ok(stored)
            }
            Err(err) => {
                if matches!(err, LifecycleError::Conflict { .. }) {
                    metrics::record_conflict();
                    debug!(error = %err, event, "Document commit lost a race");
                }
                Err(err)
            }
        }
    }

    async fn commit_contract(&self, contract: Contract, event: &str) -> LifecycleResult<Contract> {
        match self.contracts.put(contract).await {
            Ok(stored) => {
                metrics::record_transition("contract", event);
                Ok(stored)
            }
            Err(err) => {
                if matches!(err, LifecycleError::Conflict { .. }) {
                    metrics::record_conflict();
                    debug!(error = %err, event, "Contract commit lost a race");
                }
                Err(err)
            }
        }
    }

    /// Best-effort: the state change this describes is already committed.
    async fn notify(&self, batch: Vec<NewNotification>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len();
        if let Err(err) = self.notifications.insert_many(batch).await {
            metrics::record_notify_failure();
            warn!(error = %err, count, "Failed to insert notifications");
        }
    }
}

#[async_trait]
impl<D, C, N> DocumentLifecycleApi for LifecycleService<D, C, N>
where
    D: DocumentStore + 'static,
    C: ContractStore + 'static,
    N: NotificationStore + 'static,
{
    async fn upload(&self, request: UploadRequest) -> LifecycleResult<Document> {
        let doc = Document::upload(
            request.owner,
            request.name,
            request.required_signers,
            request.artifact_hash,
            request.timeout,
            self.clock.now(),
        )?;
        let doc = self.commit_document(doc, "uploaded").await?;
        info!(
            document_key = %doc.key,
            owner = %doc.owner,
            signers = doc.required_signers.len(),
            "Document uploaded"
        );
        self.notify(notices::signature_requested(&doc)).await;
        Ok(doc)
    }

    async fn sign(
        &self,
        key: DocumentKey,
        signer: SignerKey,
        signed_hash: ContentHash,
    ) -> LifecycleResult<Document> {
        let mut doc = self.documents.get(&key).await?;
        doc.apply_signature(signer.clone(), signed_hash, self.clock.now())?;

        let event = if doc.status == DocumentStatus::Finalized {
            "finalized"
        } else {
            "signed"
        };
        let doc = self.commit_document(doc, event).await?;
        info!(
            document_key = %doc.key,
            signer = %signer,
            status = %doc.status,
            "Signature recorded"
        );
        self.notify(notices::signed(&doc, &signer)).await;
        Ok(doc)
    }

    async fn reject(&self, key: DocumentKey, signer: SignerKey) -> LifecycleResult<Document> {
        let mut doc = self.documents.get(&key).await?;
        doc.apply_rejection(signer.clone(), self.clock.now())?;
        let doc = self.commit_document(doc, "rejected").await?;
        info!(document_key = %doc.key, signer = %signer, "Signature rejected");
        self.notify(notices::rejected(&doc, &signer)).await;
        Ok(doc)
    }

    async fn cancel(
        &self,
        key: DocumentKey,
        requester: SignerKey,
        force: bool,
    ) -> LifecycleResult<Document> {
        let mut doc = self.documents.get(&key).await?;
        Self::owner_check(doc.is_owner(&requester), &requester)?;
        if !doc.cancel(force, self.clock.now())? {
            debug!(document_key = %doc.key, status = %doc.status, "Forced cancel on terminal document");
            return Ok(doc);
        }
        let doc = self.commit_document(doc, "cancelled").await?;
        info!(document_key = %doc.key, "Document cancelled");
        self.notify(notices::cancelled(&doc)).await;
        Ok(doc)
    }

    async fn sweep_expired(&self, now: Timestamp) -> LifecycleResult<Vec<Document>> {
        let candidates = self
            .documents
            .expired(now)
            .await
            .map_err(|err| LifecycleError::Unavailable {
                reason: err.to_string(),
            })?;

        let mut transitioned = Vec::new();
        for mut doc in candidates {
            let key = doc.key;
            if !doc.expire(now) {
                continue;
            }
            match self.commit_document(doc, "expired").await {
                Ok(stored) => {
                    self.notify(notices::expired(&stored)).await;
                    transitioned.push(stored);
                }
                Err(err) => {
                    metrics::record_sweep_failure("expiry");
                    warn!(document_key = %key, error = %err, "Skipping document during expiry sweep");
                }
            }
        }

        if !transitioned.is_empty() {
            info!(count = transitioned.len(), "Documents expired");
        }
        Ok(transitioned)
    }

    async fn rename_or_reschedule(
        &self,
        key: DocumentKey,
        requester: SignerKey,
        new_name: Option<String>,
        new_timeout: Option<Timestamp>,
    ) -> LifecycleResult<Document> {
        let mut doc = self.documents.get(&key).await?;
        Self::owner_check(doc.is_owner(&requester), &requester)?;
        doc.amend(new_name, new_timeout, self.clock.now())?;
        let doc = self.commit_document(doc, "amended").await?;
        info!(document_key = %doc.key, "Document updated");
        Ok(doc)
    }

    async fn get_document(&self, key: DocumentKey) -> LifecycleResult<Document> {
        self.documents.get(&key).await
    }

    async fn document_history(&self, key: DocumentKey) -> LifecycleResult<Vec<Revision>> {
        self.documents.history(&key).await
    }

    async fn documents_owned_by(&self, owner: SignerKey) -> LifecycleResult<Vec<Document>> {
        self.documents.find(DocumentQuery::OwnedBy(owner)).await
    }

    async fn expected_signatures(
        &self,
        signer: SignerKey,
        status: Option<DocumentStatus>,
    ) -> LifecycleResult<Vec<Document>> {
        self.documents
            .find(DocumentQuery::ExpectedFrom { signer, status })
            .await
    }

    async fn pending_signatures(&self, signer: SignerKey) -> LifecycleResult<Vec<Document>> {
        let expected = self
            .documents
            .find(DocumentQuery::ExpectedFrom {
                signer: signer.clone(),
                status: Some(DocumentStatus::Waiting),
            })
            .await?;
        Ok(expected
            .into_iter()
            .filter(|d| !d.has_signed(&signer) && !d.has_rejected(&signer))
            .collect())
    }

    async fn successful_signatures(&self, signer: SignerKey) -> LifecycleResult<Vec<Document>> {
        self.documents.find(DocumentQuery::SignedBy(signer)).await
    }

    async fn resolve_signer(&self, email: &str) -> LifecycleResult<SignerKey> {
        if email.trim().is_empty() {
            return Err(LifecycleError::invalid("email must not be empty"));
        }
        self.directory.resolve(email).await
    }
}

#[async_trait]
impl<D, C, N> ContractLifecycleApi for LifecycleService<D, C, N>
where
    D: DocumentStore + 'static,
    C: ContractStore + 'static,
    N: NotificationStore + 'static,
{
    async fn create_contract(
        &self,
        owner: SignerKey,
        name: String,
        participants: Vec<SignerKey>,
    ) -> LifecycleResult<Contract> {
        let contract = Contract::create(owner, name, participants, self.clock.now())?;
        let contract = self.commit_contract(contract, "created").await?;
        info!(contract_key = %contract.key, owner = %contract.owner, "Contract created");
        self.notify(notices::contract_created(&contract)).await;
        Ok(contract)
    }

    async fn add_clause(
        &self,
        key: ContractKey,
        requester: SignerKey,
        clause: Clause,
    ) -> LifecycleResult<Contract> {
        let mut contract = self.contracts.get(&key).await?;
        Self::owner_check(contract.is_owner(&requester), &requester)?;
        let clause_id = clause.id.clone();
        contract.add_clause(clause, self.clock.now())?;
        let contract = self.commit_contract(contract, "clause_added").await?;
        info!(contract_key = %contract.key, clause_id = %clause_id, "Clause added");
        self.notify(notices::clause_added(&contract, &clause_id)).await;
        Ok(contract)
    }

    async fn add_participant(
        &self,
        key: ContractKey,
        requester: SignerKey,
        participant: SignerKey,
    ) -> LifecycleResult<Contract> {
        let mut contract = self.contracts.get(&key).await?;
        Self::owner_check(contract.is_owner(&requester), &requester)?;
        if !contract.add_participant(participant.clone(), self.clock.now())? {
            return Ok(contract);
        }
        let contract = self.commit_contract(contract, "participant_added").await?;
        info!(contract_key = %contract.key, participant = %participant, "Participant added");
        self.notify(notices::participant_added(&contract, &participant))
            .await;
        Ok(contract)
    }

    async fn cancel_contract(
        &self,
        key: ContractKey,
        requester: SignerKey,
        force: bool,
    ) -> LifecycleResult<Contract> {
        let mut contract = self.contracts.get(&key).await?;
        Self::owner_check(contract.is_owner(&requester), &requester)?;
        if !contract.cancel(force, self.clock.now())? {
            return Ok(contract);
        }
        let contract = self.commit_contract(contract, "cancelled").await?;
        info!(contract_key = %contract.key, "Contract cancelled");
        self.notify(notices::contract_cancelled(&contract)).await;
        Ok(contract)
    }

    async fn execute_due_contracts(&self, now: Timestamp) -> LifecycleResult<Vec<Contract>> {
        let candidates = self
            .contracts
            .active()
            .await
            .map_err(|err| LifecycleError::Unavailable {
                reason: err.to_string(),
            })?;

        let mut changed = Vec::new();
        for mut contract in candidates {
            let key = contract.key;
            let executed = contract.execute_due(now);
            if executed.is_empty() {
                continue;
            }
            match self.commit_contract(contract, "executed").await {
                Ok(stored) => {
                    debug!(contract_key = %key, clauses = ?executed, "Clauses executed");
                    self.notify(notices::clauses_executed(&stored, &executed))
                        .await;
                    changed.push(stored);
                }
                Err(err) => {
                    metrics::record_sweep_failure("execution");
                    warn!(contract_key = %key, error = %err, "Skipping contract during execution sweep");
                }
            }
        }

        if !changed.is_empty() {
            info!(count = changed.len(), "Contracts advanced");
        }
        Ok(changed)
    }

    async fn get_contract(&self, key: ContractKey) -> LifecycleResult<Contract> {
        self.contracts.get(&key).await
    }

    async fn contracts_involving(&self, signer: SignerKey) -> LifecycleResult<Vec<Contract>> {
        self.contracts.involving(&signer).await
    }
}
