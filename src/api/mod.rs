//! HTTP surface.
//!
//! - `envelope`: the `{codigo, mensagem, dados}` response body
//! - `validation`: request validation and error message translation
//! - `error`: errors rendered as envelopes
//! - `login`: the login endpoint and its business-logic seam

pub mod envelope;
pub mod error;
pub mod login;
pub mod validation;

pub use envelope::Envelope;
pub use error::ApiError;
pub use login::{AccountLookup, LoginRequest, LoginService};

use crate::db::SessionScope;
use axum::Router;
use axum::routing::post;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionScope,
    pub login: Arc<dyn LoginService>,
}

impl AppState {
    pub fn new(sessions: SessionScope, login: Arc<dyn LoginService>) -> Self {
        Self { sessions, login }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let login_route = post(login::login).fallback(method_not_allowed);
    Router::new()
        .route("/router", login_route.clone())
        .route("/router/", login_route)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> Envelope {
    Envelope::failure(404, "Recurso não encontrado")
}

async fn method_not_allowed() -> Envelope {
    Envelope::failure(405, "Método não permitido")
}
