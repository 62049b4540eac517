//! DB Session Server Library
//!
//! A pooled, transactional database session manager (PostgreSQL, MySQL, SQLite)
//! behind a login HTTP endpoint that answers with a uniform JSON envelope.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod transport;

pub use api::{AppState, Envelope};
pub use config::{Config, PoolSettings};
pub use db::{PoolManager, Session, SessionScope};
pub use error::{DbError, DbResult};
