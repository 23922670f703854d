//! # Auth Module
//!
//! HTTP Basic authentication against stored Argon2id password hashes.
//! The storage layer only ever sees the resulting [`AccountId`].

pub mod errors;
pub mod crypto;
pub mod account;
pub mod user;
pub mod authenticator;

pub use errors::{AuthError, AuthResult};
pub use account::AccountId;
pub use user::{InMemoryUserRepository, SqliteUserRepository, User, UserRepository};
pub use authenticator::{Authenticator, Credentials, PasswordAuthenticator};
