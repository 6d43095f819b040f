//! # cl-01-document-lifecycle
//!
//! Document and contract lifecycle engine.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Signature State Machine**: who may sign or reject, when, exactly once
//! - **Owner-Gated Mutation**: cancel, rename and reschedule
//! - **Expiry Sweep**: overdue `Waiting` documents become `Expired`
//! - **Contract Execution**: dependency-ordered clause auto-execution
//! - **Optimistic Concurrency**: every commit is a compare-and-swap on `version`
//!
//! ## Architecture
//!
//! ```text
//! Request handler ──sign/cancel/...──→ LifecycleService ──put (CAS)──→ DocumentStore
//!                                            │
//! Sweep driver ──sweep_expired(now)─────────→│
//!                                            └── insert_many ──→ NotificationStore ──→ Hub
//! ```
//!
//! ## Document State Machine
//!
//! ```text
//! [WAITING] ──all signed──→ [FINALIZED]
//!     │
//!     ├──timeout <= now──→ [EXPIRED]
//!     │
//!     └──owner cancel────→ [CANCELLED]
//! ```
//!
//! Terminal states are absorbing. Rejection never changes status.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cl_01_document_lifecycle::{LifecycleService, UploadRequest};
//! use cl_01_document_lifecycle::ports::inbound::DocumentLifecycleApi;
//!
//! let service = LifecycleService::new(documents, contracts, notifications, directory);
//!
//! let doc = service.upload(request).await?;
//! let doc = service.sign(doc.key, signer, signed_hash).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryContractStore, InMemoryDocumentStore, InMemorySignerDirectory};
pub use domain::{Clause, Contract, ContractStatus, Document, DocumentStatus, Revision};
pub use error::{LifecycleError, LifecycleResult};
pub use ports::inbound::{ContractLifecycleApi, DocumentLifecycleApi, UploadRequest};
pub use ports::outbound::{
    ContractStore, DocumentQuery, DocumentStore, MockTimeSource, SignerDirectory,
    SystemTimeSource, TimeSource,
};
pub use service::LifecycleService;
