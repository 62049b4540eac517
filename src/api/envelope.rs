//! The response envelope shared by every endpoint.
//!
//! Every response body, success or failure, is `{"codigo", "mensagem", "dados"}`
//! and the HTTP status equals `codigo`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub codigo: u16,
    pub mensagem: String,
    #[serde(default)]
    pub dados: Vec<JsonValue>,
}

impl Envelope {
    pub fn new(codigo: u16, mensagem: impl Into<String>, dados: Vec<JsonValue>) -> Self {
        Self {
            codigo,
            mensagem: mensagem.into(),
            dados,
        }
    }

    /// Envelope carrying a data payload.
    pub fn success<I>(codigo: u16, mensagem: impl Into<String>, dados: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<JsonValue>,
    {
        Self::new(codigo, mensagem, dados.into_iter().map(Into::into).collect())
    }

    /// Envelope with an empty `dados` array.
    pub fn failure(codigo: u16, mensagem: impl Into<String>) -> Self {
        Self::new(codigo, mensagem, Vec::new())
    }

    /// HTTP status for this envelope, 500 when `codigo` is not a valid status code.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.codigo).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
