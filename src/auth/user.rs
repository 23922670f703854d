//! # User Management
//!
//! Accounts and the repositories that store them.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::crypto::{hash_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use crate::database::{Database, DatabaseError};

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account identifier handed to the storage layer
    pub id: AccountId,

    /// Login name (unique)
    pub username: String,

    /// Argon2id password hash (never plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given username and password
    pub fn new(username: String, password: &str, policy: &PasswordPolicy) -> AuthResult<Self> {
        policy.validate(password)?;

        Ok(Self {
            id: AccountId::new(),
            username,
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        })
    }

    /// Verify a password against this user's stored hash
    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }
}

/// User repository trait
///
/// Abstracts storage operations for users.
pub trait UserRepository: Send + Sync {
    /// Find a user by their username
    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Create a new user
    fn create(&self, user: &User) -> AuthResult<()>;
}

/// In-memory user repository for testing
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;

        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }

        users.push(user.clone());
        Ok(())
    }
}

/// User repository backed by the `users` table
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    db: Arc<Database>,
}

impl SqliteUserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl UserRepository for SqliteUserRepository {
    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
        })?;

        let Some((id, username, password_hash, created_at)) = row else {
            return Ok(None);
        };

        let id = id
            .parse::<AccountId>()
            .map_err(|e| AuthError::StorageError(format!("Corrupt user id: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AuthError::StorageError(format!("Corrupt timestamp: {}", e)))?;

        Ok(Some(User {
            id,
            username,
            password_hash,
            created_at,
        }))
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let result = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.password_hash,
                    user.created_at.to_rfc3339()
                ],
            )
        });

        match result {
            Ok(_) => Ok(()),
            Err(DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(AuthError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_policy() -> PasswordPolicy {
        PasswordPolicy::default()
    }

    #[test]
    fn test_user_creation() {
        let user = User::new("testuser".to_string(), "testpassword", &default_policy()).unwrap();

        assert_eq!(user.username, "testuser");
        assert!(!user.password_hash.is_empty());
        assert_ne!(user.password_hash, "testpassword"); // Not plaintext!
        assert!(user.verify_password("testpassword").unwrap());
        assert!(!user.verify_password("wrong_password").unwrap());
    }

    #[test]
    fn test_weak_password_rejected() {
        let policy = PasswordPolicy {
            min_length: 10,
            ..Default::default()
        };

        let result = User::new("testuser".to_string(), "short", &policy);
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_in_memory_repository() {
        let repo = InMemoryUserRepository::new();
        let user = User::new("testuser".to_string(), "testpassword", &default_policy()).unwrap();
        repo.create(&user).unwrap();

        let found = repo.find_by_username("testuser").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.find_by_username("other").unwrap().is_none());

        let dup = User::new("testuser".to_string(), "password456", &default_policy()).unwrap();
        assert!(matches!(repo.create(&dup), Err(AuthError::UsernameTaken)));
    }

    #[test]
    fn test_sqlite_repository() {
        let repo = SqliteUserRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        let user = User::new("testuser".to_string(), "testpassword", &default_policy()).unwrap();
        repo.create(&user).unwrap();

        let found = repo.find_by_username("testuser").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(found.verify_password("testpassword").unwrap());

        let dup = User::new("testuser".to_string(), "password456", &default_policy()).unwrap();
        assert!(matches!(repo.create(&dup), Err(AuthError::UsernameTaken)));
    }

    #[test]
    fn test_user_serialization_omits_password() {
        let user = User::new("testuser".to_string(), "testpassword", &default_policy()).unwrap();
        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("password_hash"));
        assert!(!json.contains(&user.password_hash));
    }
}
