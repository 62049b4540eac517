//! The login endpoint.
//!
//! The handler validates the body, then runs the configured [`LoginService`]
//! inside one transactional session.

use crate::api::AppState;
use crate::api::envelope::Envelope;
use crate::api::error::ApiError;
use crate::api::validation::{RawFieldError, StringField, parse_body};
use crate::db::Session;
use crate::models::{DatabaseType, QueryParam};
use axum::body::Bytes;
use axum::extract::State;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tracing::{info, warn};

const USUARIO: StringField = StringField::new("usuario", 3, 100);
const SENHA: StringField = StringField::new("senha", 1, 128);

/// Validated login payload.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub usuario: String,
    pub senha: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("usuario", &self.usuario)
            .field("senha", &"****")
            .finish()
    }
}

impl LoginRequest {
    /// Parse and validate a request body, collecting every field error.
    pub fn from_body(body: &[u8]) -> Result<Self, Vec<RawFieldError>> {
        let fields = parse_body(body)?;
        let mut errors = Vec::new();
        let usuario = USUARIO.extract(&fields, &mut errors);
        let senha = SENHA.extract(&fields, &mut errors);

        match (usuario, senha) {
            (Some(usuario), Some(senha)) if errors.is_empty() => Ok(Self { usuario, senha }),
            _ => Err(errors),
        }
    }
}

/// Business logic behind the login endpoint.
///
/// Runs inside a session: returning `Ok` commits, returning `Err` rolls back.
pub trait LoginService: Send + Sync {
    fn authenticate<'s>(
        &'s self,
        session: &'s mut Session<'_>,
        request: LoginRequest,
    ) -> BoxFuture<'s, Result<Envelope, ApiError>>;
}

/// Looks the account up with a parameterized query.
///
/// The query gets the user as its first parameter and the password as its
/// second. Any returned row means success and the rows become `dados`.
#[derive(Debug, Clone)]
pub struct AccountLookup {
    query: String,
}

impl AccountLookup {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn default_query(db_type: DatabaseType) -> &'static str {
        match db_type {
            DatabaseType::PostgreSQL => {
                "SELECT usuario FROM usuarios WHERE usuario = $1 AND senha = $2"
            }
            DatabaseType::MySQL | DatabaseType::SQLite => {
                "SELECT usuario FROM usuarios WHERE usuario = ? AND senha = ?"
            }
        }
    }

    pub fn for_backend(db_type: DatabaseType) -> Self {
        Self::new(Self::default_query(db_type))
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl LoginService for AccountLookup {
    fn authenticate<'s>(
        &'s self,
        session: &'s mut Session<'_>,
        request: LoginRequest,
    ) -> BoxFuture<'s, Result<Envelope, ApiError>> {
        Box::pin(async move {
            let params = [
                QueryParam::from(request.usuario),
                QueryParam::from(request.senha),
            ];
            let rows = session.fetch_all(&self.query, &params).await?;
            if rows.is_empty() {
                warn!("Login rejected: no matching account");
                return Ok(Envelope::failure(401, "Usuário ou senha inválidos"));
            }
            Ok(Envelope::success(200, "Login realizado com sucesso", rows))
        })
    }
}

/// POST /router
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Envelope, ApiError> {
    let request = LoginRequest::from_body(&body).map_err(ApiError::Validation)?;
    info!(usuario = %request.usuario, "Login attempt");

    let service = Arc::clone(&state.login);
    state
        .sessions
        .with_session(move |session| {
            Box::pin(async move { service.authenticate(session, request).await })
        })
        .await
}
