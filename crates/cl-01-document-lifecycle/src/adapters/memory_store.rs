//! In-memory document and contract stores
//!
//! Version check and commit happen under one write lock, which is what
//! serializes concurrent writers on the same key.

use crate::domain::{Contract, ContractStatus, Document, Revision};
use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::outbound::{ContractStore, DocumentQuery, DocumentStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{ContractKey, DocumentKey, SignerKey, Timestamp};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

trait Versioned: Clone {
    type Key: Copy + Eq + Hash + Display;

    fn key(&self) -> Self::Key;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

impl Versioned for Document {
    type Key = DocumentKey;

    fn key(&self) -> DocumentKey {
        self.key
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Versioned for Contract {
    type Key = ContractKey;

    fn key(&self) -> ContractKey {
        self.key
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

struct Entry<T> {
    current: T,
    history: Vec<(u64, Timestamp, T)>,
}

/// Versioned table shared by both stores.
struct Table<T: Versioned> {
    rows: RwLock<HashMap<T::Key, Entry<T>>>,
    unavailable: AtomicBool,
}

impl<T: Versioned> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    fn check_available(&self) -> LifecycleResult<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(LifecycleError::Unavailable {
                reason: "store offline".into(),
            });
        }
        Ok(())
    }

    fn get(&self, key: &T::Key) -> LifecycleResult<T> {
        self.check_available()?;
        self.rows
            .read()
            .get(key)
            .map(|e| e.current.clone())
            .ok_or_else(|| LifecycleError::NotFound {
                what: key.to_string(),
            })
    }

    fn put(&self, mut item: T) -> LifecycleResult<T> {
        self.check_available()?;
        let key = item.key();
        let mut rows = self.rows.write();

        let actual = rows.get(&key).map_or(0, |e| e.current.version());
        if actual != item.version() {
            return Err(LifecycleError::Conflict {
                key: key.to_string(),
                expected: item.version(),
                actual,
            });
        }

        let version = actual + 1;
        item.set_version(version);
        let revision = (version, Utc::now(), item.clone());
        match rows.get_mut(&key) {
            Some(entry) => {
                entry.current = item.clone();
                entry.history.push(revision);
            }
            None => {
                rows.insert(
                    key,
                    Entry {
                        current: item.clone(),
                        history: vec![revision],
                    },
                );
            }
        }
        debug!(key = %key, version, "Committed");
        Ok(item)
    }

    fn scan<F>(&self, predicate: F) -> LifecycleResult<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        self.check_available()?;
        Ok(self
            .rows
            .read()
            .values()
            .map(|e| &e.current)
            .filter(|item| predicate(item))
            .cloned()
            .collect())
    }
}

/// In-memory `DocumentStore`
pub struct InMemoryDocumentStore {
    table: Table<Document>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }

    /// Make every call fail with `Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.table.unavailable.store(unavailable, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.table.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_creation<T, F>(mut items: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> Timestamp,
{
    items.sort_by_key(|i| created(i));
    items
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &DocumentKey) -> LifecycleResult<Document> {
        self.table.get(key)
    }

    async fn put(&self, doc: Document) -> LifecycleResult<Document> {
        self.table.put(doc)
    }

    async fn history(&self, key: &DocumentKey) -> LifecycleResult<Vec<Revision>> {
        self.table.check_available()?;
        self.table
            .rows
            .read()
            .get(key)
            .map(|e| {
                e.history
                    .iter()
                    .map(|(version, committed_at, snapshot)| Revision {
                        version: *version,
                        committed_at: *committed_at,
                        snapshot: snapshot.clone(),
                    })
                    .collect()
            })
            .ok_or_else(|| LifecycleError::NotFound {
                what: key.to_string(),
            })
    }

    async fn expired(&self, now: Timestamp) -> LifecycleResult<Vec<Document>> {
        let found = self.table.scan(|d| d.is_expired_at(now))?;
        Ok(sort_by_creation(found, |d| d.created_at))
    }

    async fn find(&self, query: DocumentQuery) -> LifecycleResult<Vec<Document>> {
        let found = self.table.scan(|d| query.matches(d))?;
        Ok(sort_by_creation(found, |d| d.created_at))
    }
}

/// In-memory `ContractStore`
pub struct InMemoryContractStore {
    table: Table<Contract>,
}

impl InMemoryContractStore {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.table.unavailable.store(unavailable, Ordering::Release);
    }
}

impl Default for InMemoryContractStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractStore for InMemoryContractStore {
    async fn get(&self, key: &ContractKey) -> LifecycleResult<Contract> {
        self.table.get(key)
    }

    async fn put(&self, contract: Contract) -> LifecycleResult<Contract> {
        self.table.put(contract)
    }

    async fn active(&self) -> LifecycleResult<Vec<Contract>> {
        let found = self.table.scan(|c| c.status == ContractStatus::Active)?;
        Ok(sort_by_creation(found, |c| c.created_at))
    }

    async fn involving(&self, signer: &SignerKey) -> LifecycleResult<Vec<Contract>> {
        let found = self
            .table
            .scan(|c| c.is_owner(signer) || c.participants.contains(signer))?;
        Ok(sort_by_creation(found, |c| c.created_at))
    }
}
