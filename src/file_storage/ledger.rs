//! # Ownership Ledger
//!
//! Append-only table linking digests to the accounts that uploaded them.
//! Duplicate (digest, account) pairs are allowed: every upload leaves its own
//! record.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::digest::Digest;
use super::errors::{LedgerError, LedgerResult};
use crate::auth::AccountId;

/// Ledger row identifier
pub type RecordId = i64;

/// A single ownership link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub id: RecordId,
    pub digest: Digest,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
}

/// Persistent mapping from (digest, account) to ownership records
pub trait OwnershipLedger: Send + Sync {
    /// Append a record
    fn record_ownership(&self, digest: &Digest, account_id: &AccountId) -> LedgerResult<RecordId>;

    /// First record matching the exact pair, if any
    fn find_owned_record(
        &self,
        digest: &Digest,
        account_id: &AccountId,
    ) -> LedgerResult<Option<OwnershipRecord>>;

    /// Remove exactly one record
    fn delete_record(&self, id: RecordId) -> LedgerResult<()>;

    /// Number of records referencing `digest`, across all accounts
    fn count_records(&self, digest: &Digest) -> LedgerResult<u64>;

    /// Number of records referencing `digest` other than `exclude`
    fn count_other_records(&self, digest: &Digest, exclude: RecordId) -> LedgerResult<u64>;
}

/// In-memory ledger for testing
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: RwLock<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    next_id: RecordId,
    records: Vec<OwnershipRecord>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OwnershipLedger for InMemoryLedger {
    fn record_ownership(&self, digest: &Digest, account_id: &AccountId) -> LedgerResult<RecordId> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Backend("Lock poisoned".to_string()))?;
        state.next_id += 1;
        let id = state.next_id;
        state.records.push(OwnershipRecord {
            id,
            digest: digest.clone(),
            account_id: *account_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn find_owned_record(
        &self,
        digest: &Digest,
        account_id: &AccountId,
    ) -> LedgerResult<Option<OwnershipRecord>> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Backend("Lock poisoned".to_string()))?;
        Ok(state
            .records
            .iter()
            .find(|r| &r.digest == digest && &r.account_id == account_id)
            .cloned())
    }

    fn delete_record(&self, id: RecordId) -> LedgerResult<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Backend("Lock poisoned".to_string()))?;
        let position = state
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(LedgerError::NotFound(id))?;
        state.records.remove(position);
        Ok(())
    }

    fn count_records(&self, digest: &Digest) -> LedgerResult<u64> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Backend("Lock poisoned".to_string()))?;
        Ok(state.records.iter().filter(|r| &r.digest == digest).count() as u64)
    }

    fn count_other_records(&self, digest: &Digest, exclude: RecordId) -> LedgerResult<u64> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Backend("Lock poisoned".to_string()))?;
        Ok(state
            .records
            .iter()
            .filter(|r| &r.digest == digest && r.id != exclude)
            .count() as u64)
    }
}
