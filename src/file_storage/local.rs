//! # Local Filesystem Backend
//!
//! Objects are written to a private temp file first and renamed into their
//! sharded location, so a concurrent reader sees either nothing or the whole
//! object.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::{ObjectStore, WriteOutcome};
use super::digest::Digest;
use super::errors::{StorageError, StorageResult};
use super::layout::resolve_path;

/// Directory under the root that holds in-flight writes
pub const TMP_DIR: &str = ".tmp";

/// Local filesystem object store
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new local backend rooted at `root`.
    ///
    /// The root and its temp area are created if missing.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(TMP_DIR))
            .map_err(|e| StorageError::io("Error creating storage root", e))?;
        info!(path = %root.display(), "Opened object store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of an object
    pub fn object_path(&self, digest: &Digest) -> PathBuf {
        resolve_path(&self.root, digest)
    }

    fn tmp_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join(TMP_DIR)
            .join(format!("{}.{}.partial", digest, Uuid::new_v4()))
    }

    /// Remove temp files left behind by an interrupted write.
    ///
    /// Only safe while no writes are in flight, i.e. at startup.
    pub fn sweep_temp(&self) -> StorageResult<usize> {
        let tmp_dir = self.root.join(TMP_DIR);
        let entries = match fs::read_dir(&tmp_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::io("Error listing temp directory", e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("Error listing temp directory", e))?;
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Could not remove stale temp file"),
            }
        }
        if removed > 0 {
            info!(removed, "Swept stale temp files");
        }
        Ok(removed)
    }

    fn write_new_object(&self, digest: &Digest, data: &[u8], dest: &Path) -> StorageResult<()> {
        let tmp = self.tmp_path(digest);

        let written = File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(data)?;
                file.sync_all()
            })
            .map_err(|e| StorageError::io("Error writing file", e));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        // rename replaces atomically; a racing writer can only have placed identical bytes
        if let Err(e) = fs::rename(&tmp, dest) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::io("Error moving file into place", e));
        }

        if let Some(parent) = dest.parent() {
            fsync_dir(parent);
        }
        Ok(())
    }
}

impl ObjectStore for LocalBackend {
    fn exists(&self, digest: &Digest) -> StorageResult<bool> {
        match fs::metadata(self.object_path(digest)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io("Error checking file", e)),
        }
    }

    fn write(&self, digest: &Digest, data: &[u8]) -> StorageResult<WriteOutcome> {
        let dest = self.object_path(digest);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io("Error creating directory", e))?;
        }

        if self.exists(digest)? {
            debug!(digest = %digest, "Object already present");
            return Ok(WriteOutcome::AlreadyPresent);
        }

        self.write_new_object(digest, data, &dest)?;
        debug!(digest = %digest, path = %dest.display(), size = data.len(), "Wrote object");
        Ok(WriteOutcome::Created)
    }

    fn read(&self, digest: &Digest) -> StorageResult<Vec<u8>> {
        fs::read(self.object_path(digest)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(digest.to_string())
            } else {
                StorageError::io("Error reading file", e)
            }
        })
    }

    fn remove(&self, digest: &Digest) -> StorageResult<()> {
        fs::remove_file(self.object_path(digest)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(digest.to_string())
            } else {
                StorageError::io("Error deleting file", e)
            }
        })
    }
}

fn fsync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}
