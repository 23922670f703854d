//! # File Storage Errors

use thiserror::Error;

use crate::database::DatabaseError;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by the storage service and object store
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Malformed request body
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Digest string is empty, the wrong length, or not hex
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Digest absent, or not owned by the caller (same message either way)
    #[error("File not found: {0}")]
    NotFound(String),

    /// Filesystem failure; the bytes may not be safe
    #[error("I/O error: {0}")]
    Io(String),

    /// Ledger lookup failed before anything was changed
    #[error("Ledger unavailable: {0}")]
    Ledger(String),

    /// Ledger failure after a storage mutation was already committed
    #[error("Persistence error for {digest}: {reason}")]
    Persistence { digest: String, reason: String },
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::InvalidInput(_) => 400,
            StorageError::InvalidDigest(_) => 400,
            StorageError::NotFound(_) => 404,
            StorageError::Io(_) => 500,
            StorageError::Ledger(_) => 500,
            StorageError::Persistence { .. } => 500,
        }
    }

    /// Stable label used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::InvalidInput(_) | StorageError::InvalidDigest(_) => "invalid_input",
            StorageError::NotFound(_) => "not_found",
            StorageError::Io(_) => "storage_io",
            StorageError::Ledger(_) => "ledger",
            StorageError::Persistence { .. } => "persistence",
        }
    }

    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        StorageError::Io(format!("{}: {}", context, err))
    }

    pub(crate) fn ledger(err: impl ToString) -> Self {
        StorageError::Ledger(err.to_string())
    }

    pub(crate) fn persistence(digest: impl Into<String>, err: impl ToString) -> Self {
        StorageError::Persistence {
            digest: digest.into(),
            reason: err.to_string(),
        }
    }
}

/// Ownership ledger errors
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Ownership record not found: {0}")]
    NotFound(i64),

    #[error("Ledger backend error: {0}")]
    Backend(String),
}

impl From<DatabaseError> for LedgerError {
    fn from(err: DatabaseError) -> Self {
        LedgerError::Backend(err.to_string())
    }
}
