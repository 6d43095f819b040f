//! Error types for the Document Lifecycle subsystem

use shared_types::StoreError;
use thiserror::Error;

/// Lifecycle engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Caller supplied malformed or incomplete input
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Signer is not one of the required signers
    #[error("Signer {signer} is not eligible for this document")]
    NotEligible { signer: String },

    /// Mutation requested by someone other than the owner
    #[error("Requester {requester} is not the owner")]
    NotOwner { requester: String },

    /// Signer already has a successful signature on record
    #[error("Signer {signer} has already signed")]
    AlreadySigned { signer: String },

    /// Signer already declined
    #[error("Signer {signer} has already rejected")]
    AlreadyRejected { signer: String },

    /// Document is not accepting signatures
    #[error("Document is not signable in status {status}")]
    NotSignable { status: String },

    /// Aggregate already reached a terminal status
    #[error("Already terminal: {status}")]
    AlreadyTerminal { status: String },

    /// Update request carried no fields
    #[error("No fields to update")]
    NoFieldsToUpdate,

    /// Compare-and-swap lost against a concurrent writer
    #[error("Conflict on {key}: expected version {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// Entity not found
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Collaborator or storage failure
    #[error("Unavailable: {reason}")]
    Unavailable { reason: String },
}

impl LifecycleError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Safe to retry with fresh state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Unavailable { .. })
    }

    /// Business-rule violation surfaced verbatim to the caller.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::NotEligible { .. }
                | Self::NotOwner { .. }
                | Self::AlreadySigned { .. }
                | Self::AlreadyRejected { .. }
                | Self::NotSignable { .. }
                | Self::AlreadyTerminal { .. }
        )
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound { what },
            StoreError::Unavailable(reason) => Self::Unavailable { reason },
        }
    }
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
