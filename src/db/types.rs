//! Row decoding into JSON.
//!
//! Columns are decoded by trying a short list of Rust types in order. sqlx
//! checks type compatibility before decoding, so the first compatible type wins;
//! NULL decodes as `null` on the first attempt.

use crate::models::JsonRow;
use serde_json::Value as JsonValue;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo};
use tracing::debug;

/// Decode every column of a row into a JSON object keyed by column name.
pub fn row_to_json<'r, R>(row: &'r R) -> JsonRow
where
    R: Row,
    usize: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
    i16: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
    f32: Decode<'r, R::Database> + Type<R::Database>,
    bool: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let value = decode_column(row, idx).unwrap_or_else(|| {
                debug!(
                    column = %col.name(),
                    type_name = %col.type_info().name(),
                    "Unsupported column type, returning null"
                );
                JsonValue::Null
            });
            (col.name().to_string(), value)
        })
        .collect()
}

fn decode_column<'r, R>(row: &'r R, idx: usize) -> Option<JsonValue>
where
    R: Row,
    usize: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
    i16: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
    f32: Decode<'r, R::Database> + Type<R::Database>,
    bool: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, JsonValue::from));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, |f| JsonValue::from(f64::from(f))));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Some(v.map_or(JsonValue::Null, JsonValue::from));
    }
    None
}
