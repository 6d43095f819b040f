//! Domain module for the Document Lifecycle subsystem
//!
//! ## Core Modules
//! - document: Document aggregate and signature state machine
//! - contract: Contract aggregate with dependency-ordered clauses
//! - notices: Notification records emitted after each committed change

pub mod contract;
pub mod document;
pub mod notices;

pub use contract::{Clause, Contract, ContractStatus};
pub use document::{Document, DocumentStatus, Revision, UnknownStatusCode};
