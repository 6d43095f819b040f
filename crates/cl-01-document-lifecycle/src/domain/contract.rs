//! Contract aggregate: clauses executed by the sweep instead of signatures

use crate::error::{LifecycleError, LifecycleResult};
use serde::{Deserialize, Serialize};
use shared_types::{ContractKey, SignerKey, Timestamp};
use std::collections::HashSet;
use std::fmt;

/// Contract status (`Active → {Executed, Cancelled}`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ContractStatus {
    Active,
    Executed,
    Cancelled,
}

impl ContractStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Executed => 1,
            Self::Cancelled => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }
}

impl From<ContractStatus> for u8 {
    fn from(status: ContractStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for ContractStatus {
    type Error = super::document::UnknownStatusCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Active),
            1 => Ok(Self::Executed),
            2 => Ok(Self::Cancelled),
            other => Err(super::document::UnknownStatusCode(other)),
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Executed => "executed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A single executable term of a contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    pub id: String,
    pub description: String,
    pub action_type: String,
    pub auto_executable: bool,
    pub execute_after: Option<Timestamp>,
    /// Clause ids that must execute before this one.
    pub dependencies: Vec<String>,
    pub executed_at: Option<Timestamp>,
}

impl Clause {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        action_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            action_type: action_type.into(),
            auto_executable: true,
            execute_after: None,
            dependencies: Vec::new(),
            executed_at: None,
        }
    }

    #[must_use]
    pub fn manual(mut self) -> Self {
        self.auto_executable = false;
        self
    }

    #[must_use]
    pub fn execute_after(mut self, at: Timestamp) -> Self {
        self.execute_after = Some(at);
        self
    }

    #[must_use]
    pub fn depends_on(mut self, clause_id: impl Into<String>) -> Self {
        self.dependencies.push(clause_id.into());
        self
    }

    pub fn is_executed(&self) -> bool {
        self.executed_at.is_some()
    }
}

/// Contract aggregate root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub key: ContractKey,
    pub name: String,
    pub owner: SignerKey,
    pub participants: Vec<SignerKey>,
    pub clauses: Vec<Clause>,
    pub status: ContractStatus,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Contract {
    pub fn create(
        owner: SignerKey,
        name: impl Into<String>,
        participants: Vec<SignerKey>,
        now: Timestamp,
    ) -> LifecycleResult<Self> {
        let name = name.into();
        if owner.is_blank() {
            return Err(LifecycleError::invalid("owner must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(LifecycleError::invalid("name must not be empty"));
        }
        if participants.iter().any(SignerKey::is_blank) {
            return Err(LifecycleError::invalid("participant keys must not be empty"));
        }

        let mut unique: Vec<SignerKey> = Vec::with_capacity(participants.len());
        for participant in participants {
            if !unique.contains(&participant) {
                unique.push(participant);
            }
        }

        Ok(Self {
            key: ContractKey::generate(),
            name,
            owner,
            participants: unique,
            clauses: Vec::new(),
            status: ContractStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owner(&self, signer: &SignerKey) -> bool {
        &self.owner == signer
    }

    fn ensure_active(&self) -> LifecycleResult<()> {
        if self.status.is_terminal() {
            return Err(LifecycleError::AlreadyTerminal {
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    pub fn add_clause(&mut self, clause: Clause, now: Timestamp) -> LifecycleResult<()> {
        self.ensure_active()?;
        if clause.id.trim().is_empty() {
            return Err(LifecycleError::invalid("clause id must not be empty"));
        }
        if self.clauses.iter().any(|c| c.id == clause.id) {
            return Err(LifecycleError::invalid(format!(
                "duplicate clause id {}",
                clause.id
            )));
        }
        if let Some(missing) = clause
            .dependencies
            .iter()
            .find(|dep| !self.clauses.iter().any(|c| &c.id == *dep))
        {
            return Err(LifecycleError::invalid(format!(
                "unknown clause dependency {missing}"
            )));
        }

        let mut clause = clause;
        clause.executed_at = None;
        self.clauses.push(clause);
        self.updated_at = now;
        Ok(())
    }

    /// Returns `false` when the participant was already present.
    pub fn add_participant(&mut self, participant: SignerKey, now: Timestamp) -> LifecycleResult<bool> {
        self.ensure_active()?;
        if participant.is_blank() {
            return Err(LifecycleError::invalid("participant key must not be empty"));
        }
        if self.participants.contains(&participant) {
            return Ok(false);
        }
        self.participants.push(participant);
        self.updated_at = now;
        Ok(true)
    }

    /// Same contract as `Document::cancel`.
    pub fn cancel(&mut self, force: bool, now: Timestamp) -> LifecycleResult<bool> {
        if self.status.is_terminal() {
            if force {
                return Ok(false);
            }
            return Err(LifecycleError::AlreadyTerminal {
                status: self.status.to_string(),
            });
        }
        self.status = ContractStatus::Cancelled;
        self.updated_at = now;
        Ok(true)
    }

    /// Execute every clause due at `now`.
    ///
    /// Dependencies are judged against the clauses executed before this
    /// call, so a dependency chain advances one level per pass.
    ///
    /// # Returns
    ///
    /// Ids of the clauses executed in this pass, in clause order.
    pub fn execute_due(&mut self, now: Timestamp) -> Vec<String> {
        if self.status.is_terminal() {
            return Vec::new();
        }

        let done_before: HashSet<String> = self
            .clauses
            .iter()
            .filter(|c| c.is_executed())
            .map(|c| c.id.clone())
            .collect();

        let mut executed = Vec::new();
        for clause in &mut self.clauses {
            let due = clause.auto_executable
                && !clause.is_executed()
                && clause.execute_after.map_or(true, |at| at <= now)
                && clause.dependencies.iter().all(|d| done_before.contains(d));
            if due {
                clause.executed_at = Some(now);
                executed.push(clause.id.clone());
            }
        }

        if !executed.is_empty() {
            if self.clauses.iter().all(Clause::is_executed) {
                self.status = ContractStatus::Executed;
            }
            self.updated_at = now;
        }
        executed
    }

    /// Owner followed by participants, without duplicates.
    pub fn audience(&self) -> Vec<SignerKey> {
        let mut audience = vec![self.owner.clone()];
        for participant in &self.participants {
            if !audience.contains(participant) {
                audience.push(participant.clone());
            }
        }
        audience
    }
}
