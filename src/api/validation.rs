//! Request body validation and client-facing error messages.
//!
//! Validation produces [`RawFieldError`]s tagged with a machine-readable `kind`.
//! [`map_validation_errors`] turns them into the `{campo, erro}` pairs returned in
//! the `dados` of a 422 envelope, translating each kind through a fixed message
//! table.

use crate::models::JsonRow;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;

/// Message templates by error kind. `{name}` placeholders are filled from the
/// error context.
const MESSAGE_TABLE: &[(&str, &str)] = &[
    ("missing", "Campo obrigatório"),
    ("string_type", "O valor deve ser um texto"),
    (
        "string_too_short",
        "O campo deve ter no mínimo {min_length} caracteres",
    ),
    (
        "string_too_long",
        "O campo deve ter no máximo {max_length} caracteres",
    ),
    ("json_invalid", "JSON inválido: {error}"),
    ("model_type", "O corpo da requisição deve ser um objeto JSON"),
];

pub fn message_template(kind: &str) -> Option<&'static str> {
    MESSAGE_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, template)| *template)
}

/// One element of an error location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationItem {
    Key(String),
    Index(usize),
}

impl From<&str> for LocationItem {
    fn from(key: &str) -> Self {
        LocationItem::Key(key.to_string())
    }
}

impl From<usize> for LocationItem {
    fn from(index: usize) -> Self {
        LocationItem::Index(index)
    }
}

/// A validation failure before translation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFieldError {
    pub location: Vec<LocationItem>,
    pub kind: String,
    pub message: String,
    pub context: BTreeMap<String, JsonValue>,
}

impl RawFieldError {
    pub fn new(
        location: impl IntoIterator<Item = LocationItem>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into_iter().collect(),
            kind: kind.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// The last element of the location when it is a key, otherwise "".
    pub fn field(&self) -> &str {
        match self.location.last() {
            Some(LocationItem::Key(key)) => key,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub campo: String,
    pub erro: String,
}

impl FieldError {
    pub fn into_value(self) -> JsonValue {
        json!({ "campo": self.campo, "erro": self.erro })
    }
}

/// Translate raw validation errors, keeping their order.
pub fn map_validation_errors(errors: &[RawFieldError]) -> Vec<FieldError> {
    errors
        .iter()
        .map(|err| {
            let template = message_template(&err.kind).unwrap_or(err.message.as_str());
            FieldError {
                campo: err.field().to_string(),
                erro: interpolate(template, &err.context),
            }
        })
        .collect()
}

fn interpolate(template: &str, context: &BTreeMap<String, JsonValue>) -> String {
    context.iter().fold(template.to_string(), |text, (key, value)| {
        let placeholder = format!("{{{}}}", key);
        if !text.contains(&placeholder) {
            return text;
        }
        let rendered = match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        text.replace(&placeholder, &rendered)
    })
}

/// Parse a request body that must be a JSON object.
pub fn parse_body(body: &[u8]) -> Result<JsonRow, Vec<RawFieldError>> {
    let value: JsonValue = serde_json::from_slice(body).map_err(|e| {
        vec![
            RawFieldError::new(
                [LocationItem::from("body"), LocationItem::from(e.column())],
                "json_invalid",
                "JSON decode error",
            )
            .with_context("error", e.to_string()),
        ]
    })?;

    match value {
        JsonValue::Object(map) => Ok(map),
        _ => Err(vec![RawFieldError::new(
            [LocationItem::from("body")],
            "model_type",
            "Input should be a valid dictionary",
        )]),
    }
}

/// A required string field with length bounds counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct StringField {
    pub name: &'static str,
    pub min_length: usize,
    pub max_length: usize,
}

impl StringField {
    pub const fn new(name: &'static str, min_length: usize, max_length: usize) -> Self {
        Self {
            name,
            min_length,
            max_length,
        }
    }

    /// Read the field from `body`, pushing any failure onto `errors`.
    pub fn extract(&self, body: &JsonRow, errors: &mut Vec<RawFieldError>) -> Option<String> {
        let location = || [LocationItem::from("body"), LocationItem::from(self.name)];

        let value = match body.get(self.name) {
            None => {
                errors.push(RawFieldError::new(location(), "missing", "Field required"));
                return None;
            }
            Some(JsonValue::String(s)) => s,
            Some(_) => {
                errors.push(RawFieldError::new(
                    location(),
                    "string_type",
                    "Input should be a valid string",
                ));
                return None;
            }
        };

        let length = value.chars().count();
        if length < self.min_length {
            errors.push(
                RawFieldError::new(
                    location(),
                    "string_too_short",
                    format!("String should have at least {} characters", self.min_length),
                )
                .with_context("min_length", self.min_length),
            );
            return None;
        }
        if length > self.max_length {
            errors.push(
                RawFieldError::new(
                    location(),
                    "string_too_long",
                    format!("String should have at most {} characters", self.max_length),
                )
                .with_context("max_length", self.max_length),
            );
            return None;
        }

        Some(value.clone())
    }
}
