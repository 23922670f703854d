//! CLI module for hashvault
//!
//! Provides command-line interface for:
//! - init: Create data directory, object root and schema
//! - serve: Run the HTTP API
//! - add-user: Register an account

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{add_user, init, init_layout, register_user, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_response, write_response_to};
