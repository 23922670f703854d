//! SQLite database holding accounts and ownership records
//!
//! Object bytes live on the filesystem; this database only stores bookkeeping.
//!
//! ## Tables
//!
//! - `users` - Accounts and their Argon2id password hashes
//! - `file_hashes` - Ownership records (digest, account)

pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

/// Database errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Shared SQLite connection
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database file and bring the schema up to date
    pub fn open(path: &Path) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening SQLite database at {:?}", path);

        let conn = Connection::open(path)?;

        // WAL keeps readers from blocking on the single writer
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(schema::init_schema)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        debug!("Opening in-memory SQLite database");

        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.with_conn(schema::init_schema)?;
        Ok(db)
    }

    /// Run `f` with exclusive access to the connection
    pub fn with_conn<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(f(&conn)?)
    }
}
