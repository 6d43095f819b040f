//! Document aggregate and its signature state machine

use crate::error::{LifecycleError, LifecycleResult};
use serde::{Deserialize, Serialize};
use shared_types::{ContentHash, DocumentKey, SignerKey, Timestamp};
use std::fmt;
use thiserror::Error;

/// Document status with stable numeric codes.
///
/// ```text
///            ┌──sign (all)──→ [FINALIZED]
/// [WAITING] ─┼──timeout─────→ [EXPIRED]
///            └──cancel──────→ [CANCELLED]
/// ```
///
/// `Unavailable` is a legacy code: it is never produced, is not signable,
/// and can still be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DocumentStatus {
    Waiting,
    Unavailable,
    Expired,
    Finalized,
    Cancelled,
}

/// Numeric status code outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown status code {0}")]
pub struct UnknownStatusCode(pub u8);

impl DocumentStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Unavailable => 1,
            Self::Expired => 2,
            Self::Finalized => 3,
            Self::Cancelled => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Finalized | Self::Cancelled)
    }

    pub fn is_signable(self) -> bool {
        self == Self::Waiting
    }
}

impl From<DocumentStatus> for u8 {
    fn from(status: DocumentStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for DocumentStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Waiting),
            1 => Ok(Self::Unavailable),
            2 => Ok(Self::Expired),
            3 => Ok(Self::Finalized),
            4 => Ok(Self::Cancelled),
            other => Err(UnknownStatusCode(other)),
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Unavailable => "unavailable",
            Self::Expired => "expired",
            Self::Finalized => "finalized",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Document aggregate root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub key: DocumentKey,
    pub name: String,
    pub status: DocumentStatus,
    pub owner: SignerKey,
    pub required_signers: Vec<SignerKey>,
    pub successful_signers: Vec<SignerKey>,
    pub rejected_signers: Vec<SignerKey>,
    pub original_hash: ContentHash,
    pub final_hash: Option<ContentHash>,
    pub timeout: Timestamp,
    /// Store-owned revision counter; 0 until the first commit.
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Build a fresh `Waiting` document after validating the upload.
    ///
    /// Duplicate required signers are collapsed, first occurrence wins.
    pub fn upload(
        owner: SignerKey,
        name: impl Into<String>,
        required_signers: Vec<SignerKey>,
        original_hash: ContentHash,
        timeout: Timestamp,
        now: Timestamp,
    ) -> LifecycleResult<Self> {
        if owner.is_blank() {
            return Err(LifecycleError::invalid("owner must not be empty"));
        }
        if required_signers.is_empty() {
            return Err(LifecycleError::invalid("at least one signer is required"));
        }
        if required_signers.iter().any(SignerKey::is_blank) {
            return Err(LifecycleError::invalid("signer keys must not be empty"));
        }
        if original_hash.is_empty() {
            return Err(LifecycleError::invalid("artifact hash must not be empty"));
        }

        let mut signers: Vec<SignerKey> = Vec::with_capacity(required_signers.len());
        for signer in required_signers {
            if !signers.contains(&signer) {
                signers.push(signer);
            }
        }

        Ok(Self {
            key: DocumentKey::generate(),
            name: name.into(),
            status: DocumentStatus::Waiting,
            owner,
            required_signers: signers,
            successful_signers: Vec::new(),
            rejected_signers: Vec::new(),
            original_hash,
            final_hash: None,
            timeout,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owner(&self, signer: &SignerKey) -> bool {
        &self.owner == signer
    }

    pub fn is_required(&self, signer: &SignerKey) -> bool {
        self.required_signers.contains(signer)
    }

    pub fn has_signed(&self, signer: &SignerKey) -> bool {
        self.successful_signers.contains(signer)
    }

    pub fn has_rejected(&self, signer: &SignerKey) -> bool {
        self.rejected_signers.contains(signer)
    }

    /// Required signers with no signature yet, in required order.
    pub fn pending_signers(&self) -> impl Iterator<Item = &SignerKey> {
        self.required_signers
            .iter()
            .filter(move |s| !self.successful_signers.contains(s))
    }

    /// Set equality between successful and required signers.
    pub fn is_fully_signed(&self) -> bool {
        self.required_signers
            .iter()
            .all(|s| self.successful_signers.contains(s))
    }

    /// `Waiting` and past its deadline.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.status == DocumentStatus::Waiting && self.timeout <= now
    }

    /// Check whether `signer` may sign or reject right now.
    ///
    /// Eligibility is checked first so a non-member always sees `NotEligible`.
    pub fn check_actionable(&self, signer: &SignerKey) -> LifecycleResult<()> {
        if !self.is_required(signer) {
            return Err(LifecycleError::NotEligible {
                signer: signer.to_string(),
            });
        }
        if self.has_signed(signer) {
            return Err(LifecycleError::AlreadySigned {
                signer: signer.to_string(),
            });
        }
        if self.has_rejected(signer) {
            return Err(LifecycleError::AlreadyRejected {
                signer: signer.to_string(),
            });
        }
        if !self.status.is_signable() {
            return Err(LifecycleError::NotSignable {
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    /// Record a signature and finalize once every required signer signed.
    pub fn apply_signature(
        &mut self,
        signer: SignerKey,
        signed_hash: ContentHash,
        now: Timestamp,
    ) -> LifecycleResult<()> {
        self.check_actionable(&signer)?;
        if signed_hash.is_empty() {
            return Err(LifecycleError::invalid("signed artifact hash must not be empty"));
        }

        self.successful_signers.push(signer);
        self.final_hash = Some(signed_hash);
        if self.is_fully_signed() {
            self.status = DocumentStatus::Finalized;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Record a rejection. Status is left untouched.
    pub fn apply_rejection(&mut self, signer: SignerKey, now: Timestamp) -> LifecycleResult<()> {
        self.check_actionable(&signer)?;
        self.rejected_signers.push(signer);
        self.updated_at = now;
        Ok(())
    }

    /// Move to `Cancelled`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - Status changed
    /// - `Ok(false)` - Already terminal and `force` was set; nothing changed
    pub fn cancel(&mut self, force: bool, now: Timestamp) -> LifecycleResult<bool> {
        if self.status.is_terminal() {
            if force {
                return Ok(false);
            }
            return Err(LifecycleError::AlreadyTerminal {
                status: self.status.to_string(),
            });
        }
        self.status = DocumentStatus::Cancelled;
        self.updated_at = now;
        Ok(true)
    }

    /// Move to `Expired` if the deadline passed. Returns whether it changed.
    pub fn expire(&mut self, now: Timestamp) -> bool {
        if !self.is_expired_at(now) {
            return false;
        }
        self.status = DocumentStatus::Expired;
        self.updated_at = now;
        true
    }

    /// Apply a rename and/or reschedule. Status is never changed.
    pub fn amend(
        &mut self,
        new_name: Option<String>,
        new_timeout: Option<Timestamp>,
        now: Timestamp,
    ) -> LifecycleResult<()> {
        if new_name.is_none() && new_timeout.is_none() {
            return Err(LifecycleError::NoFieldsToUpdate);
        }
        if let Some(name) = new_name {
            if name.trim().is_empty() {
                return Err(LifecycleError::invalid("name must not be empty"));
            }
            self.name = name;
        }
        if let Some(timeout) = new_timeout {
            self.timeout = timeout;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// One committed `put` of a document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub version: u64,
    pub committed_at: Timestamp,
    pub snapshot: Document,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn signer(s: &str) -> SignerKey {
        SignerKey::new(s)
    }

    fn waiting_doc() -> Document {
        let now = Utc::now();
        Document::upload(
            signer("owner"),
            "lease.pdf",
            vec![signer("s1"), signer("s2")],
            ContentHash::of(b"pdf"),
            now + Duration::days(1),
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_upload_validation() {
        let now = Utc::now();
        let hash = ContentHash::of(b"pdf");

        let empty = Document::upload(signer("o"), "n", vec![], hash.clone(), now, now);
        assert!(matches!(empty, Err(LifecycleError::InvalidInput { .. })));

        let blank = Document::upload(signer("o"), "n", vec![signer(" ")], hash.clone(), now, now);
        assert!(matches!(blank, Err(LifecycleError::InvalidInput { .. })));

        let no_hash = Document::upload(signer("o"), "n", vec![signer("a")], ContentHash::new(""), now, now);
        assert!(matches!(no_hash, Err(LifecycleError::InvalidInput { .. })));
    }

    #[test]
    fn test_upload_collapses_duplicate_signers() {
        let now = Utc::now();
        let doc = Document::upload(
            signer("o"),
            "n",
            vec![signer("a"), signer("b"), signer("a")],
            ContentHash::of(b"x"),
            now,
            now,
        )
        .unwrap();
        assert_eq!(doc.required_signers, vec![signer("a"), signer("b")]);
        assert_eq!(doc.status, DocumentStatus::Waiting);
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_signing_finalizes_on_set_equality() {
        let mut doc = waiting_doc();
        let now = Utc::now();

        doc.apply_signature(signer("s2"), ContentHash::new("h1"), now).unwrap();
        assert_eq!(doc.status, DocumentStatus::Waiting);
        assert_eq!(doc.final_hash, Some(ContentHash::new("h1")));

        doc.apply_signature(signer("s1"), ContentHash::new("h2"), now).unwrap();
        assert_eq!(doc.status, DocumentStatus::Finalized);
        assert_eq!(doc.successful_signers, vec![signer("s2"), signer("s1")]);
    }

    #[test]
    fn test_check_order_prefers_not_eligible() {
        let mut doc = waiting_doc();
        doc.status = DocumentStatus::Cancelled;

        let err = doc.check_actionable(&signer("stranger")).unwrap_err();
        assert!(matches!(err, LifecycleError::NotEligible { .. }));

        let err = doc.check_actionable(&signer("s1")).unwrap_err();
        assert!(matches!(err, LifecycleError::NotSignable { .. }));
    }

    #[test]
    fn test_rejected_signer_cannot_sign() {
        let mut doc = waiting_doc();
        let now = Utc::now();
        doc.apply_rejection(signer("s1"), now).unwrap();
        assert_eq!(doc.status, DocumentStatus::Waiting);

        let err = doc
            .apply_signature(signer("s1"), ContentHash::new("h"), now)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyRejected { .. }));
        assert!(doc.successful_signers.is_empty());
    }

    #[test]
    fn test_empty_signed_hash_rejected_without_mutation() {
        let mut doc = waiting_doc();
        let err = doc
            .apply_signature(signer("s1"), ContentHash::new(""), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidInput { .. }));
        assert!(doc.successful_signers.is_empty());
    }

    #[test]
    fn test_cancel_terminal_with_and_without_force() {
        let mut doc = waiting_doc();
        let now = Utc::now();
        assert!(doc.cancel(false, now).unwrap());
        assert_eq!(doc.status, DocumentStatus::Cancelled);

        assert!(matches!(
            doc.cancel(false, now),
            Err(LifecycleError::AlreadyTerminal { .. })
        ));
        assert!(!doc.cancel(true, now).unwrap());
        assert_eq!(doc.status, DocumentStatus::Cancelled);
    }

    #[test]
    fn test_unavailable_is_cancellable_but_not_signable() {
        let mut doc = waiting_doc();
        doc.status = DocumentStatus::Unavailable;
        assert!(matches!(
            doc.check_actionable(&signer("s1")),
            Err(LifecycleError::NotSignable { .. })
        ));
        assert!(doc.cancel(false, Utc::now()).unwrap());
    }

    #[test]
    fn test_expire_only_waiting_past_deadline() {
        let mut doc = waiting_doc();
        let before = doc.timeout - Duration::seconds(1);
        assert!(!doc.expire(before));

        assert!(doc.expire(doc.timeout));
        assert_eq!(doc.status, DocumentStatus::Expired);
        assert!(!doc.expire(doc.timeout + Duration::days(1)));
    }

    #[test]
    fn test_amend_requires_a_field() {
        let mut doc = waiting_doc();
        let now = Utc::now();
        assert_eq!(doc.amend(None, None, now), Err(LifecycleError::NoFieldsToUpdate));
        assert!(matches!(
            doc.amend(Some("  ".into()), None, now),
            Err(LifecycleError::InvalidInput { .. })
        ));

        let later = now + Duration::days(7);
        doc.amend(None, Some(later), now).unwrap();
        assert_eq!(doc.timeout, later);
        assert_eq!(doc.name, "lease.pdf");
    }

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&DocumentStatus::Finalized).unwrap();
        assert_eq!(json, "3");
        let parsed: DocumentStatus = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, DocumentStatus::Cancelled);
        assert!(serde_json::from_str::<DocumentStatus>("9").is_err());
    }
}
