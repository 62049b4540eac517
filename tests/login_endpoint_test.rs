//! End-to-end tests for the login endpoint.
//!
//! Requests go through the full router against a SQLite database and every
//! response is checked against the `{codigo, mensagem, dados}` envelope.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use db_session_server::api::{self, AccountLookup, AppState};
use db_session_server::config::PoolSettings;
use db_session_server::db::{PoolManager, SessionScope};
use db_session_server::models::{DatabaseType, QueryParam};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    pool: Arc<PoolManager>,
    router: Router,
}

async fn setup(with_accounts: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("login.db").display());
    let pool = Arc::new(PoolManager::open_url(&url, PoolSettings::default()).unwrap());
    let sessions = SessionScope::new(Arc::clone(&pool));

    if with_accounts {
        sessions
            .with_session(|session| {
                Box::pin(async move {
                    session
                        .execute("CREATE TABLE usuarios (usuario TEXT NOT NULL, senha TEXT NOT NULL)", &[])
                        .await?;
                    session
                        .execute(
                            "INSERT INTO usuarios (usuario, senha) VALUES (?, ?)",
                            &[QueryParam::from("maria"), QueryParam::from("segredo")],
                        )
                        .await
                })
            })
            .await
            .unwrap();
    }

    let state = AppState::new(
        sessions,
        Arc::new(AccountLookup::for_backend(DatabaseType::SQLite)),
    );
    TestApp {
        _dir: dir,
        pool,
        router: api::router(state),
    }
}

async fn post(router: &Router, uri: &str, body: &str) -> (StatusCode, JsonValue) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn wait_until_returned(pool: &PoolManager) {
    for _ in 0..100 {
        if pool.status().checked_out == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("connections still checked out: {:?}", pool.status());
}

#[tokio::test]
async fn test_login_success() {
    let app = setup(true).await;

    let (status, body) = post(
        &app.router,
        "/router/",
        r#"{"usuario": "maria", "senha": "segredo"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "codigo": 200,
            "mensagem": "Login realizado com sucesso",
            "dados": [{"usuario": "maria"}]
        })
    );
    wait_until_returned(&app.pool).await;
}

#[tokio::test]
async fn test_login_without_trailing_slash() {
    let app = setup(true).await;

    let (status, body) = post(
        &app.router,
        "/router",
        r#"{"usuario": "maria", "senha": "segredo"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["codigo"], 200);
}

#[tokio::test]
async fn test_wrong_password_is_401() {
    let app = setup(true).await;

    let (status, body) = post(
        &app.router,
        "/router/",
        r#"{"usuario": "maria", "senha": "errada"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"codigo": 401, "mensagem": "Usuário ou senha inválidos", "dados": []})
    );
}

#[tokio::test]
async fn test_missing_field_is_422() {
    let app = setup(true).await;

    let (status, body) = post(&app.router, "/router/", r#"{"senha": "segredo"}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({
            "codigo": 422,
            "mensagem": "erro",
            "dados": [{"campo": "usuario", "erro": "Campo obrigatório"}]
        })
    );
}

#[tokio::test]
async fn test_every_invalid_field_is_reported() {
    let app = setup(true).await;

    let (status, body) = post(&app.router, "/router/", r#"{"usuario": "ab", "senha": 7}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["dados"],
        json!([
            {"campo": "usuario", "erro": "O campo deve ter no mínimo 3 caracteres"},
            {"campo": "senha", "erro": "O valor deve ser um texto"}
        ])
    );
}

#[tokio::test]
async fn test_malformed_json_is_422() {
    let app = setup(true).await;

    let (status, body) = post(&app.router, "/router/", r#"{"usuario": "#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["mensagem"], "erro");
    let erro = body["dados"][0]["erro"].as_str().unwrap();
    assert!(erro.starts_with("JSON inválido: "), "{}", erro);
}

#[tokio::test]
async fn test_database_failure_is_500_envelope() {
    let app = setup(false).await;

    let (status, body) = post(
        &app.router,
        "/router/",
        r#"{"usuario": "maria", "senha": "segredo"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["codigo"], 500);
    assert_eq!(
        body["mensagem"],
        "Erro: Database error: no such table: usuarios"
    );
    assert_eq!(body["dados"], json!([]));
    wait_until_returned(&app.pool).await;
}

#[tokio::test]
async fn test_closed_pool_is_500_envelope() {
    let app = setup(true).await;
    app.pool.dispose().await;

    let (status, body) = post(
        &app.router,
        "/router/",
        r#"{"usuario": "maria", "senha": "segredo"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["mensagem"], "Erro: Connection pool is closed");
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let app = setup(false).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["mensagem"], "Recurso não encontrado");
}
