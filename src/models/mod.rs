//! Data models for the session server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionConfigError, DatabaseType, REQUIRED_ENV_VARS,
};
pub use query::{JsonRow, QueryParam};
