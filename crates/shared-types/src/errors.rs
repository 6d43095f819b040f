//! # Error Types
//!
//! Defines error types shared by every store port.

use thiserror::Error;

/// Errors a persistence collaborator can report.
///
/// Optimistic-concurrency conflicts are not listed here: they carry
/// aggregate-specific context and live with the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend failed or is unreachable; safe to retry later.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
