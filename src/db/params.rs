//! Parameter binding utilities for database queries.
//!
//! This module binds `QueryParam` values to database-specific query objects.
//! Each backend gets its own impl so that the dispatch macro can call
//! `bind_all` from a single body.

use crate::models::QueryParam;
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Postgres, Sqlite};

/// A query that can take a [`QueryParam`] as its next bound argument.
pub(crate) trait BindParam<'q>: Sized {
    fn bind_param(self, param: &'q QueryParam) -> Self;
}

impl<'q> BindParam<'q> for Query<'q, MySql, MySqlArguments> {
    fn bind_param(self, param: &'q QueryParam) -> Self {
        match param {
            QueryParam::Null => self.bind(None::<String>),
            QueryParam::Bool(v) => self.bind(*v),
            QueryParam::Int(v) => self.bind(*v),
            QueryParam::Float(v) => self.bind(*v),
            QueryParam::String(v) => self.bind(v.as_str()),
        }
    }
}

impl<'q> BindParam<'q> for Query<'q, Postgres, PgArguments> {
    fn bind_param(self, param: &'q QueryParam) -> Self {
        match param {
            QueryParam::Null => self.bind(None::<String>),
            QueryParam::Bool(v) => self.bind(*v),
            QueryParam::Int(v) => self.bind(*v),
            QueryParam::Float(v) => self.bind(*v),
            QueryParam::String(v) => self.bind(v.as_str()),
        }
    }
}

impl<'q> BindParam<'q> for Query<'q, Sqlite, SqliteArguments<'q>> {
    fn bind_param(self, param: &'q QueryParam) -> Self {
        match param {
            QueryParam::Null => self.bind(None::<String>),
            QueryParam::Bool(v) => self.bind(*v),
            QueryParam::Int(v) => self.bind(*v),
            QueryParam::Float(v) => self.bind(*v),
            QueryParam::String(v) => self.bind(v.as_str()),
        }
    }
}

/// Bind every parameter, in order.
pub(crate) fn bind_all<'q, Q: BindParam<'q>>(query: Q, params: &'q [QueryParam]) -> Q {
    params.iter().fold(query, Q::bind_param)
}
