//! CLI argument definitions using clap
//!
//! Commands:
//! - hashvault init --config <path>
//! - hashvault serve --config <path> [--host <host>] [--port <port>]
//! - hashvault add-user --username <name> --password <password>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hashvault - content-addressed file storage with per-account ownership
#[derive(Parser, Debug)]
#[command(name = "hashvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory, object root and database schema
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./hashvault.json")]
        config: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./hashvault.json")]
        config: PathBuf,

        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Register an account
    AddUser {
        /// Path to configuration file
        #[arg(long, default_value = "./hashvault.json")]
        config: PathBuf,

        #[arg(long)]
        username: String,

        #[arg(long, env = "HASHVAULT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
