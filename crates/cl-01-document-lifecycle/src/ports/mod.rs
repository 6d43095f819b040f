//! Ports module for the Document Lifecycle subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{ContractLifecycleApi, DocumentLifecycleApi, UploadRequest};
pub use outbound::{
    ContractStore, DocumentQuery, DocumentStore, MockTimeSource, SignerDirectory,
    SystemTimeSource, TimeSource,
};
