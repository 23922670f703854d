//! # Authenticator
//!
//! Maps HTTP Basic credentials to an [`AccountId`].

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use super::account::AccountId;
use super::crypto::{hash_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use super::user::{User, UserRepository};

/// Username/password pair taken from a request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization: Basic <base64(user:pass)>` header value
    pub fn from_basic_header(value: &str) -> AuthResult<Self> {
        let (scheme, encoded) = value
            .trim()
            .split_once(' ')
            .ok_or(AuthError::MalformedHeader)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::MalformedHeader);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| AuthError::MalformedHeader)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;

        // passwords may contain ':'; usernames may not
        let (username, password) = decoded.split_once(':').ok_or(AuthError::MalformedHeader)?;
        Ok(Self::new(username, password))
    }

    /// Render as a Basic header value
    pub fn to_basic_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.username, self.password))
        )
    }
}

/// Verifies credentials; rejected requests never reach the storage layer
pub trait Authenticator: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> AuthResult<AccountId>;
}

const DUMMY_PASSWORD: &str = "hashvault-unknown-user";

/// Authenticator backed by stored Argon2id password hashes
#[derive(Debug)]
pub struct PasswordAuthenticator<R: UserRepository> {
    users: R,
    policy: PasswordPolicy,
    /// Verified against for unknown usernames so both paths cost one argon2 run
    dummy_hash: OnceLock<String>,
}

impl<R: UserRepository> PasswordAuthenticator<R> {
    pub fn new(users: R, policy: PasswordPolicy) -> Self {
        Self {
            users,
            policy,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Register a new account
    pub fn register(&self, username: &str, password: &str) -> AuthResult<User> {
        if username.is_empty() {
            return Err(AuthError::InvalidUsername("must not be empty".to_string()));
        }
        if username.contains(':') {
            return Err(AuthError::InvalidUsername(
                "must not contain ':'".to_string(),
            ));
        }
        let user = User::new(username.to_string(), password, &self.policy)?;
        self.users.create(&user)?;
        info!(username = %user.username, account = %user.id, "Registered account");
        Ok(user)
    }
}

impl<R: UserRepository> Authenticator for PasswordAuthenticator<R> {
    fn verify(&self, credentials: &Credentials) -> AuthResult<AccountId> {
        let Some(user) = self.users.find_by_username(&credentials.username)? else {
            let dummy = self
                .dummy_hash
                .get_or_init(|| hash_password(DUMMY_PASSWORD).unwrap_or_default());
            let _ = verify_password(&credentials.password, dummy);
            debug!(username = %credentials.username, "Unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.verify_password(&credentials.password)? {
            debug!(username = %credentials.username, "Wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(username = %user.username, "User authenticated successfully");
        Ok(user.id)
    }
}
