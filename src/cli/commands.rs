//! CLI command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::auth::crypto::PasswordPolicy;
use crate::auth::{PasswordAuthenticator, SqliteUserRepository, User};
use crate::config::StoreConfig;
use crate::database::Database;
use crate::file_storage::LocalBackend;
use crate::http_server::HttpServer;
use crate::observability::init_tracing;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, host, port } => serve(&config, host, port),
        Command::AddUser {
            config,
            username,
            password,
        } => add_user(&config, &username, &password),
    }
}

/// Create the data directory, object root and database schema
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = StoreConfig::load(config_path)?;
    init_layout(&config)?;

    write_response(json!({
        "initialized": true,
        "storage_dir": config.storage_dir().display().to_string(),
        "database": config.database_path().display().to_string(),
    }))
}

/// Idempotent: re-running on an initialized directory changes nothing
pub fn init_layout(config: &StoreConfig) -> CliResult<()> {
    fs::create_dir_all(&config.data_dir).map_err(|e| {
        CliError::config_error(format!(
            "Failed to create directory {:?}: {}",
            config.data_dir, e
        ))
    })?;

    LocalBackend::open(config.storage_dir())?;
    Database::open(&config.database_path())?;
    Ok(())
}

/// Serve the HTTP API until ctrl-c
pub fn serve(config_path: &Path, host: Option<String>, port: Option<u16>) -> CliResult<()> {
    let mut config = StoreConfig::load(config_path)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate()?;

    let _log_guard = init_tracing(
        &config.log_filter,
        config.log_json,
        config.log_dir.as_deref(),
    )?;

    let server = HttpServer::open(config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Register an account
pub fn add_user(config_path: &Path, username: &str, password: &str) -> CliResult<()> {
    let config = StoreConfig::load(config_path)?;
    let user = register_user(&config, username, password)?;

    write_response(json!({
        "account_id": user.id.to_string(),
        "username": user.username,
    }))
}

pub fn register_user(config: &StoreConfig, username: &str, password: &str) -> CliResult<User> {
    let db = Arc::new(Database::open(&config.database_path())?);
    let authenticator =
        PasswordAuthenticator::new(SqliteUserRepository::new(db), PasswordPolicy::default());

    let user = authenticator.register(username, password)?;
    info!(username = %user.username, account = %user.id, "Account registered");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authenticator, Credentials};
    use crate::cli::errors::CliErrorCode;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> StoreConfig {
        StoreConfig {
            data_dir: temp.path().join("data"),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_init_layout() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);

        init_layout(&config).unwrap();
        assert!(config.storage_dir().join(".tmp").is_dir());
        assert!(config.database_path().is_file());

        // second run is a no-op
        init_layout(&config).unwrap();
    }

    #[test]
    fn test_register_user_then_verify() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        init_layout(&config).unwrap();

        let user = register_user(&config, "alice", "password123").unwrap();

        let db = Arc::new(Database::open(&config.database_path()).unwrap());
        let authenticator =
            PasswordAuthenticator::new(SqliteUserRepository::new(db), PasswordPolicy::default());
        let account = authenticator
            .verify(&Credentials::new("alice", "password123"))
            .unwrap();
        assert_eq!(account, user.id);
    }

    #[test]
    fn test_register_duplicate_user() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        init_layout(&config).unwrap();

        register_user(&config, "alice", "password123").unwrap();
        let err = register_user(&config, "alice", "password456").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::UserRejected);
    }

    #[test]
    fn test_register_bad_username_names_the_problem() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        init_layout(&config).unwrap();

        let err = register_user(&config, "ali:ce", "password123").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::UserRejected);
        assert!(err.message().contains("Invalid username"));
        assert!(!err.message().contains("Invalid credentials"));
    }
}
