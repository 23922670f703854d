//! # File Service
//!
//! Upload, download and delete on top of an [`ObjectStore`] and an
//! [`OwnershipLedger`].
//!
//! Storage changes are committed before ledger changes in both directions, so
//! the ledger never claims ownership of bytes that were never written. When the
//! ledger step fails after storage succeeded, the caller gets
//! [`StorageError::Persistence`] rather than [`StorageError::Io`]. Ledger
//! failures before any mutation are [`StorageError::Ledger`].

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::backend::{ObjectStore, WriteOutcome};
use super::digest::Digest;
use super::errors::{LedgerError, StorageError, StorageResult};
use super::ledger::{OwnershipLedger, RecordId};
use crate::auth::AccountId;

/// Returned by a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub digest: Digest,
    pub record_id: RecordId,
    pub size: u64,
    /// False when identical content was already stored
    pub created: bool,
}

/// Returned by a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// False when other ownership records still reference the object
    pub object_removed: bool,
}

/// Content-addressed file service
#[derive(Debug)]
pub struct FileService<S: ObjectStore, L: OwnershipLedger> {
    store: S,
    ledger: L,
}

impl<S: ObjectStore, L: OwnershipLedger> FileService<S, L> {
    /// Create a new file service
    pub fn new(store: S, ledger: L) -> Self {
        Self { store, ledger }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Store `data` and record `account_id` as an owner
    pub fn upload(&self, data: &[u8], account_id: &AccountId) -> StorageResult<UploadReceipt> {
        let digest = Digest::compute(data);

        let outcome = self.store.write(&digest, data).map_err(|e| {
            error!(digest = %digest, kind = e.kind(), error = %e, "Error writing file");
            e
        })?;

        let record_id = self
            .ledger
            .record_ownership(&digest, account_id)
            .map_err(|e| {
                // bytes are on disk but this account has no record
                error!(
                    digest = %digest,
                    account = %account_id,
                    error = %e,
                    "Error saving to database"
                );
                StorageError::persistence(digest.as_str(), e)
            })?;

        info!(digest = %digest, account = %account_id, size = data.len(), "File added to database");

        Ok(UploadReceipt {
            digest,
            record_id,
            size: data.len() as u64,
            created: outcome == WriteOutcome::Created,
        })
    }

    /// Fetch an object. No ownership check: knowing the digest is enough.
    pub fn download(&self, digest: &str) -> StorageResult<Vec<u8>> {
        let digest = Self::lookup_digest(digest)?;

        if !self.store.exists(&digest)? {
            return Err(StorageError::NotFound(digest.to_string()));
        }

        // may still race with a delete; read reports NotFound in that case
        self.store.read(&digest)
    }

    /// Delete the caller's ownership of an object.
    ///
    /// The object itself is removed only when the caller's record is the last
    /// one referencing it.
    pub fn delete(&self, digest: &str, account_id: &AccountId) -> StorageResult<DeleteOutcome> {
        let digest = Self::lookup_digest(digest)?;

        if !self.store.exists(&digest)? {
            return Err(StorageError::NotFound(digest.to_string()));
        }

        let record = self
            .ledger
            .find_owned_record(&digest, account_id)
            .map_err(StorageError::ledger)?
            .ok_or_else(|| {
                debug!(digest = %digest, account = %account_id, "Delete by non-owner");
                StorageError::NotFound(digest.to_string())
            })?;

        // a concurrent delete may already have consumed our record
        let others = self
            .ledger
            .count_other_records(&digest, record.id)
            .map_err(StorageError::ledger)?;

        let object_removed = others == 0;
        if object_removed {
            self.store.remove(&digest).map_err(|e| {
                if !matches!(e, StorageError::NotFound(_)) {
                    error!(digest = %digest, error = %e, "Error deleting file");
                }
                e
            })?;
        } else {
            debug!(digest = %digest, others, "Object still referenced, keeping bytes");
        }

        match self.ledger.delete_record(record.id) {
            Ok(()) => {}
            Err(LedgerError::NotFound(id)) => {
                warn!(digest = %digest, record = id, "Ownership record removed concurrently");
                return Err(StorageError::NotFound(digest.to_string()));
            }
            Err(e) => {
                // object may already be gone while the record stays
                error!(digest = %digest, record = record.id, error = %e, "Error deleting from database");
                return Err(StorageError::persistence(digest.as_str(), e));
            }
        }

        info!(digest = %digest, account = %account_id, object_removed, "File deleted from database");
        Ok(DeleteOutcome { object_removed })
    }

    /// Malformed digests can never be stored, so they read as absent
    fn lookup_digest(digest: &str) -> StorageResult<Digest> {
        Digest::parse(digest).map_err(|e| {
            debug!(input = digest, error = %e, "Rejected malformed digest");
            StorageError::NotFound(digest.to_string())
        })
    }
}
