//! hashvault - content-addressed file storage with per-account ownership
//!
//! Files are stored once per SHA-256 digest under a sharded directory tree;
//! a SQLite ledger records which accounts own which digests.

pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod file_storage;
pub mod http_server;
pub mod observability;
