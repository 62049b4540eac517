//! Database dispatch macro for reducing code duplication.
//!
//! Pools, pooled connections and sessions are all enums with one variant per
//! backend. The macro expands a single body into one match arm per variant, so
//! generic sqlx code is written once and type-checked against each backend.

/// Generate a match over the `MySql`, `Postgres` and `SQLite` variants of an enum.
///
/// The enum name must be in scope at the call site.
///
/// # Example
///
/// ```ignore
/// db_dispatch!(self, Session, tx => tx.commit().await.map_err(DbError::from))
/// ```
macro_rules! db_dispatch {
    ($value:expr, $kind:ident, $inner:ident => $body:expr) => {
        match $value {
            $kind::MySql($inner) => $body,
            $kind::Postgres($inner) => $body,
            $kind::SQLite($inner) => $body,
        }
    };
}

pub(crate) use db_dispatch;
