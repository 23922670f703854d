//! # Storage Layout
//!
//! `<root>/<first two hex chars>/<full digest>`. Two hex characters give at most
//! 256 shard directories.

use std::path::{Path, PathBuf};

use super::digest::Digest;
use super::errors::StorageResult;

/// Resolve the on-disk location of an object
pub fn resolve_path(root: &Path, digest: &Digest) -> PathBuf {
    root.join(digest.shard()).join(digest.as_str())
}

/// Resolve from an unvalidated digest string
pub fn resolve_path_str(root: &Path, digest: &str) -> StorageResult<PathBuf> {
    let digest = Digest::parse(digest)?;
    Ok(resolve_path(root, &digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::errors::StorageError;

    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sharded_path() {
        let path = resolve_path_str(Path::new("/srv/storage"), HELLO).unwrap();
        assert_eq!(path, PathBuf::from(format!("/srv/storage/2c/{}", HELLO)));
    }

    #[test]
    fn test_pure() {
        let digest = Digest::compute(b"hello");
        let root = Path::new("/data");
        assert_eq!(resolve_path(root, &digest), resolve_path(root, &digest));
    }

    #[test]
    fn test_root_only_changes_prefix() {
        let digest = Digest::compute(b"hello");
        let a = resolve_path(Path::new("/a"), &digest);
        let b = resolve_path(Path::new("/b/c"), &digest);
        assert_eq!(
            a.strip_prefix("/a").unwrap(),
            b.strip_prefix("/b/c").unwrap()
        );
    }

    #[test]
    fn test_rejects_malformed() {
        let root = Path::new("/data");
        assert!(matches!(
            resolve_path_str(root, ""),
            Err(StorageError::InvalidDigest(_))
        ));
        assert!(matches!(
            resolve_path_str(root, "not-a-digest"),
            Err(StorageError::InvalidDigest(_))
        ));
    }
}
