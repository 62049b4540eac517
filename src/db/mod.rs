//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management and lifecycle
//! - Transactional sessions over pooled connections
//! - Parameter binding and row decoding
//! - Database dispatch macros for reducing code duplication

pub mod macros;
pub mod params;
pub mod pool;
pub mod session;
pub mod types;

pub use pool::{DbConnection, DbPool, PoolManager, PoolStatus};
pub use session::{Session, SessionScope};
pub use types::row_to_json;
