//! HTTP-layer errors.
//!
//! Every variant renders as an [`Envelope`]; nothing else reaches the client.

use crate::api::envelope::Envelope;
use crate::api::validation::{RawFieldError, map_validation_errors};
use crate::error::DbError;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body failed validation (422)
    #[error("Request validation failed")]
    Validation(Vec<RawFieldError>),

    /// Database failure inside the unit of work (500, logged)
    #[error(transparent)]
    Db(#[from] DbError),

    /// Business logic failure (500, logged)
    #[error("{0}")]
    Service(String),
}

impl ApiError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = match &self {
            Self::Validation(errors) => {
                let dados = map_validation_errors(errors)
                    .into_iter()
                    .map(|e| e.into_value())
                    .collect();
                Envelope::new(422, "erro", dados)
            }
            Self::Db(_) | Self::Service(_) => {
                error!(error = %self, "Request failed");
                Envelope::failure(500, format!("Erro: {}", self))
            }
        };
        envelope.into_response()
    }
}
