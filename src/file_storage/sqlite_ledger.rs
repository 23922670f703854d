//! # SQLite Ownership Ledger
//!
//! Durable ledger backed by the `file_hashes` table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::digest::Digest;
use super::errors::{LedgerError, LedgerResult};
use super::ledger::{OwnershipLedger, OwnershipRecord, RecordId};
use crate::auth::AccountId;
use crate::database::Database;

/// Ledger stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    db: Arc<Database>,
}

impl SqliteLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn decode_record(row: &Row<'_>) -> rusqlite::Result<(RecordId, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_record(raw: (RecordId, String, String, String)) -> LedgerResult<OwnershipRecord> {
    let (id, digest, account_id, created_at) = raw;
    let digest = Digest::parse(&digest)
        .map_err(|e| LedgerError::Backend(format!("Corrupt digest in record {}: {}", id, e)))?;
    let account_id = account_id
        .parse::<AccountId>()
        .map_err(|e| LedgerError::Backend(format!("Corrupt account in record {}: {}", id, e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| LedgerError::Backend(format!("Corrupt timestamp in record {}: {}", id, e)))?;

    Ok(OwnershipRecord {
        id,
        digest,
        account_id,
        created_at,
    })
}

impl OwnershipLedger for SqliteLedger {
    fn record_ownership(&self, digest: &Digest, account_id: &AccountId) -> LedgerResult<RecordId> {
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO file_hashes (file_hash, account_id, created_at) VALUES (?1, ?2, ?3)",
                params![digest.as_str(), account_id.to_string(), Utc::now().to_rfc3339()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        debug!(digest = %digest, account = %account_id, record = id, "Recorded ownership");
        Ok(id)
    }

    fn find_owned_record(
        &self,
        digest: &Digest,
        account_id: &AccountId,
    ) -> LedgerResult<Option<OwnershipRecord>> {
        let raw = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, file_hash, account_id, created_at FROM file_hashes
                 WHERE file_hash = ?1 AND account_id = ?2
                 ORDER BY id LIMIT 1",
                params![digest.as_str(), account_id.to_string()],
                decode_record,
            )
            .optional()
        })?;
        raw.map(into_record).transpose()
    }

    fn delete_record(&self, id: RecordId) -> LedgerResult<()> {
        let affected = self
            .db
            .with_conn(|conn| conn.execute("DELETE FROM file_hashes WHERE id = ?1", [id]))?;
        if affected == 0 {
            return Err(LedgerError::NotFound(id));
        }
        debug!(record = id, "Deleted ownership record");
        Ok(())
    }

    fn count_records(&self, digest: &Digest) -> LedgerResult<u64> {
        let count: i64 = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM file_hashes WHERE file_hash = ?1",
                [digest.as_str()],
                |row| row.get(0),
            )
        })?;
        Ok(count as u64)
    }

    fn count_other_records(&self, digest: &Digest, exclude: RecordId) -> LedgerResult<u64> {
        let count: i64 = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM file_hashes WHERE file_hash = ?1 AND id <> ?2",
                params![digest.as_str(), exclude],
                |row| row.get(0),
            )
        })?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger() -> SqliteLedger {
        SqliteLedger::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn test_record_find_delete() {
        let ledger = ledger();
        let digest = Digest::compute(b"hello");
        let account = AccountId::new();

        let id = ledger.record_ownership(&digest, &account).unwrap();
        let record = ledger.find_owned_record(&digest, &account).unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.digest, digest);
        assert_eq!(record.account_id, account);

        ledger.delete_record(id).unwrap();
        assert!(ledger.find_owned_record(&digest, &account).unwrap().is_none());
        assert!(matches!(ledger.delete_record(id), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_counts_across_accounts() {
        let ledger = ledger();
        let digest = Digest::compute(b"shared");
        let a = AccountId::new();
        let b = AccountId::new();

        ledger.record_ownership(&digest, &a).unwrap();
        ledger.record_ownership(&digest, &a).unwrap();
        ledger.record_ownership(&digest, &b).unwrap();
        ledger.record_ownership(&Digest::compute(b"other"), &b).unwrap();

        assert_eq!(ledger.count_records(&digest).unwrap(), 3);
    }

    #[test]
    fn test_count_other_records_excludes_one_row() {
        let ledger = ledger();
        let digest = Digest::compute(b"shared");
        let a = ledger.record_ownership(&digest, &AccountId::new()).unwrap();
        let b = ledger.record_ownership(&digest, &AccountId::new()).unwrap();

        assert_eq!(ledger.count_other_records(&digest, a).unwrap(), 1);
        ledger.delete_record(b).unwrap();
        assert_eq!(ledger.count_other_records(&digest, a).unwrap(), 0);
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.db");
        let digest = Digest::compute(b"durable");
        let account = AccountId::new();

        let id = {
            let ledger = SqliteLedger::new(Arc::new(Database::open(&path).unwrap()));
            ledger.record_ownership(&digest, &account).unwrap()
        };

        let ledger = SqliteLedger::new(Arc::new(Database::open(&path).unwrap()));
        let record = ledger.find_owned_record(&digest, &account).unwrap().unwrap();
        assert_eq!(record.id, id);
    }
}
