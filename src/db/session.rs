//! Transactional units of work.
//!
//! [`SessionScope::with_session`] checks a connection out of the pool, opens a
//! transaction on it and hands the caller a [`Session`]. When the unit of work
//! returns `Ok` the transaction is committed; on `Err` it is rolled back and the
//! caller's error is returned unchanged. Either way the connection goes back to
//! the pool before `with_session` returns.
//!
//! If the surrounding future is dropped mid-flight, sqlx rolls the open
//! transaction back and returns the connection on drop.

use crate::db::macros::db_dispatch;
use crate::db::params::bind_all;
use crate::db::pool::{DbConnection, PoolManager};
use crate::db::types::row_to_json;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, JsonRow, QueryParam};
use futures_util::future::BoxFuture;
use sqlx::{Connection, MySql, Postgres, Sqlite, Transaction};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, debug_span, error, warn};
use uuid::Uuid;

/// An open transaction on a pooled connection.
pub enum Session<'c> {
    MySql(Transaction<'c, MySql>),
    Postgres(Transaction<'c, Postgres>),
    SQLite(Transaction<'c, Sqlite>),
}

impl<'c> Session<'c> {
    /// Start a transaction on the given connection.
    pub(crate) async fn begin(conn: &'c mut DbConnection) -> DbResult<Session<'c>> {
        let session = match conn {
            DbConnection::MySql(c) => Session::MySql(Connection::begin(&mut **c).await?),
            DbConnection::Postgres(c) => Session::Postgres(Connection::begin(&mut **c).await?),
            DbConnection::SQLite(c) => Session::SQLite(Connection::begin(&mut **c).await?),
        };
        Ok(session)
    }

    pub fn db_type(&self) -> DatabaseType {
        match self {
            Session::MySql(_) => DatabaseType::MySQL,
            Session::Postgres(_) => DatabaseType::PostgreSQL,
            Session::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute<'q>(&mut self, sql: &'q str, params: &'q [QueryParam]) -> DbResult<u64> {
        debug!(sql = %sql, params = params.len(), "Executing statement");
        db_dispatch!(self, Session, tx => {
            let result = bind_all(sqlx::query(sql), params)
                .execute(&mut **tx)
                .await?;
            Ok(result.rows_affected())
        })
    }

    /// Run a query and decode every row.
    pub async fn fetch_all<'q>(
        &mut self,
        sql: &'q str,
        params: &'q [QueryParam],
    ) -> DbResult<Vec<JsonRow>> {
        debug!(sql = %sql, params = params.len(), "Fetching rows");
        db_dispatch!(self, Session, tx => {
            let rows = bind_all(sqlx::query(sql), params)
                .fetch_all(&mut **tx)
                .await?;
            Ok(rows.iter().map(|row| row_to_json(row)).collect())
        })
    }

    /// Run a query and decode the first row, if any.
    pub async fn fetch_optional<'q>(
        &mut self,
        sql: &'q str,
        params: &'q [QueryParam],
    ) -> DbResult<Option<JsonRow>> {
        debug!(sql = %sql, params = params.len(), "Fetching optional row");
        db_dispatch!(self, Session, tx => {
            let row = bind_all(sqlx::query(sql), params)
                .fetch_optional(&mut **tx)
                .await?;
            Ok(row.as_ref().map(|row| row_to_json(row)))
        })
    }

    pub async fn commit(self) -> DbResult<()> {
        db_dispatch!(self, Session, tx => tx.commit().await.map_err(DbError::from))
    }

    pub async fn rollback(self) -> DbResult<()> {
        db_dispatch!(self, Session, tx => tx.rollback().await.map_err(DbError::from))
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("db_type", &self.db_type())
            .finish_non_exhaustive()
    }
}

/// How a unit of work ended, and whether its connection is fit for reuse.
struct Outcome<T, E> {
    result: Result<T, E>,
    reusable: bool,
}

/// Entry point for transactional units of work against the shared pool.
#[derive(Debug, Clone)]
pub struct SessionScope {
    pool: Arc<PoolManager>,
    unit_timeout: Option<Duration>,
}

impl SessionScope {
    pub fn new(pool: Arc<PoolManager>) -> Self {
        Self {
            pool,
            unit_timeout: None,
        }
    }

    /// Bound every unit of work by `limit`. On expiry the transaction is rolled back
    /// and the connection is discarded.
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.unit_timeout = limit;
        self
    }

    /// Run `work` inside a transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`. A commit
    /// failure is reported as [`DbError::Transaction`]. A failed rollback is logged
    /// and the original error is still returned.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let rows = scope
    ///     .with_session(|session| {
    ///         Box::pin(async move { session.fetch_all("SELECT 1 AS one", &[]).await })
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_session<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session<'_>) -> BoxFuture<'s, Result<T, E>> + Send,
        T: Send,
        E: From<DbError> + Display + Send,
    {
        let session_id = Uuid::new_v4();
        async move {
            let mut conn = self.pool.acquire().await?;
            let outcome = self.run(&mut conn, work).await;
            if outcome.reusable {
                self.pool.release(conn).await;
            } else {
                self.pool.discard(conn).await;
            }
            outcome.result
        }
        .instrument(debug_span!("session", %session_id))
        .await
    }

    async fn run<F, T, E>(&self, conn: &mut DbConnection, work: F) -> Outcome<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session<'_>) -> BoxFuture<'s, Result<T, E>> + Send,
        T: Send,
        E: From<DbError> + Display + Send,
    {
        let mut session = match Session::begin(conn).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to begin transaction");
                return Outcome {
                    result: Err(e.into()),
                    reusable: false,
                };
            }
        };

        let mut timed_out = false;
        let result = match self.unit_timeout {
            Some(limit) => match tokio::time::timeout(limit, work(&mut session)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(limit = ?limit, "Unit of work timed out");
                    timed_out = true;
                    Err(DbError::timeout("unit of work", limit).into())
                }
            },
            None => work(&mut session).await,
        };

        match result {
            Ok(value) => match session.commit().await {
                Ok(()) => {
                    debug!("Transaction committed");
                    Outcome {
                        result: Ok(value),
                        reusable: true,
                    }
                }
                Err(e) => {
                    error!(error = %e, "Commit failed");
                    Outcome {
                        result: Err(DbError::transaction(format!("commit failed: {}", e)).into()),
                        reusable: false,
                    }
                }
            },
            Err(err) => match session.rollback().await {
                Ok(()) => {
                    debug!(error = %err, "Transaction rolled back");
                    Outcome {
                        result: Err(err),
                        reusable: !timed_out,
                    }
                }
                Err(rollback_error) => {
                    error!(
                        error = %err,
                        rollback_error = %rollback_error,
                        "Rollback failed"
                    );
                    Outcome {
                        result: Err(err),
                        reusable: false,
                    }
                }
            },
        }
    }
}
