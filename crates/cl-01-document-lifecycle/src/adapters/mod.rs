//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, used by the runtime
//! and by tests.

mod directory;
mod memory_store;

pub use directory::InMemorySignerDirectory;
pub use memory_store::{InMemoryContractStore, InMemoryDocumentStore};
