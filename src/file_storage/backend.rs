//! # Object Store Trait

use super::digest::Digest;
use super::errors::StorageResult;

/// Result of a write against the object store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The object did not exist and was written
    Created,
    /// An object with this digest was already present; nothing was written
    AlreadyPresent,
}

/// Durable byte storage keyed by digest
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Check whether an object exists
    fn exists(&self, digest: &Digest) -> StorageResult<bool>;

    /// Write an object if absent.
    ///
    /// Callers must pass the bytes that `digest` was computed from.
    fn write(&self, digest: &Digest, data: &[u8]) -> StorageResult<WriteOutcome>;

    /// Read the full object
    fn read(&self, digest: &Digest) -> StorageResult<Vec<u8>>;

    /// Delete the object. Shard directories are left in place.
    fn remove(&self, digest: &Digest) -> StorageResult<()>;
}
