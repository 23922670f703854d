//! # HTTP Server Module
//!
//! Axum front end for the content-addressed store.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/upload` - Store a file for the calling account
//! - `/download/:hash` - Fetch a file by digest
//! - `/delete/:hash` - Drop the caller's ownership of a file

pub mod server;
pub mod observability_routes;
pub mod storage_routes;

pub use server::HttpServer;
pub use storage_routes::{storage_routes, StateError, StorageState};
