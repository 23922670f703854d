//! # File Storage Module
//!
//! Content-addressed object storage with per-account ownership records.
//!
//! Objects live at `<root>/<first two hex chars>/<sha256 hex>`; who owns what
//! is tracked separately in an [`OwnershipLedger`].

pub mod errors;
pub mod digest;
pub mod layout;
pub mod backend;
pub mod local;
pub mod ledger;
pub mod sqlite_ledger;
pub mod service;

pub use errors::{LedgerError, LedgerResult, StorageError, StorageResult};
pub use digest::Digest;
pub use layout::{resolve_path, resolve_path_str};
pub use backend::{ObjectStore, WriteOutcome};
pub use local::LocalBackend;
pub use ledger::{InMemoryLedger, OwnershipLedger, OwnershipRecord, RecordId};
pub use sqlite_ledger::SqliteLedger;
pub use service::{DeleteOutcome, FileService, UploadReceipt};
