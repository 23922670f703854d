//! Service Configuration
//!
//! Loaded from an optional JSON file. `DATABASE_URL` and `UPLOAD_FOLDER`
//! override the file; CLI flags override both.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// hashvault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory for everything the service writes
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Object root (default: `<data_dir>/storage`)
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// SQLite file (default: `<data_dir>/hashvault.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub log_json: bool,

    /// Also write debug-level logs to rotating files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Browser origins allowed by CORS (empty: no CORS headers)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./hashvault-data")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_log_filter() -> String {
    "hashvault=info,tower_http=info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_dir: None,
            database_path: None,
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            log_filter: default_log_filter(),
            log_json: false,
            log_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Load from `path`, falling back to defaults when the file does not exist,
    /// then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };

        config.apply_env(
            std::env::var("DATABASE_URL").ok().as_deref(),
            std::env::var("UPLOAD_FOLDER").ok().as_deref(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Apply `DATABASE_URL` / `UPLOAD_FOLDER` style overrides
    pub fn apply_env(&mut self, database_url: Option<&str>, upload_folder: Option<&str>) {
        if let Some(url) = database_url.filter(|s| !s.is_empty()) {
            let path = url.strip_prefix("sqlite:///").unwrap_or(url);
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(folder) = upload_folder.filter(|s| !s.is_empty()) {
            self.storage_dir = Some(PathBuf::from(folder));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("storage"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("hashvault.db"))
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
