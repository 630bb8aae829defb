//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and schema (db)
//! - HTTP server setup (server)
//! - Configuration loading (config)
//! - Authentication (auth)
//! - Recipe image storage (media)
//! - Reference data loaders (seed)
//! - Application state (state)

pub mod auth;
pub mod config;
pub mod db;
pub mod media;
pub mod seed;
pub mod server;
pub mod state;

pub use state::AppState;
