//! DB Session Server - Main entry point.
//!
//! Loads the database connection parameters, opens the shared pool, checks the
//! database is reachable and serves the login endpoint until a shutdown signal.

use clap::Parser;
use db_session_server::api::{AccountLookup, AppState, LoginService};
use db_session_server::config::Config;
use db_session_server::db::{PoolManager, SessionScope};
use db_session_server::models::ConnectionConfig;
use db_session_server::transport::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the variables may come from the environment
    let dotenv = dotenvy::dotenv();

    let config = Config::parse();
    init_tracing(&config);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => error!(error = %e, "Failed to read environment file"),
    }

    info!("Starting DB Session Server v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.pool_settings().map_err(|e| {
        error!(error = %e, "Invalid pool settings");
        e
    })?;

    let db_config = ConnectionConfig::load().map_err(|e| {
        error!(error = %e, "Database configuration is incomplete");
        e
    })?;
    info!(config = ?db_config.as_map(), "Database configuration loaded");

    let pool = Arc::new(PoolManager::open(&db_config, settings)?);

    if !pool.test_connectivity().await {
        pool.dispose().await;
        return Err("Failed to connect to the database".into());
    }

    let login: Arc<dyn LoginService> = match &config.login_query {
        Some(query) => Arc::new(AccountLookup::new(query.clone())),
        None => Arc::new(AccountLookup::for_backend(pool.db_type())),
    };

    let sessions = SessionScope::new(Arc::clone(&pool)).with_timeout(config.session_timeout());
    let state = AppState::new(sessions, login);

    let transport = HttpTransport::new(state, &config.http_host, config.http_port);
    info!(transport = transport.name(), "Serving requests");
    let result = transport.run().await;

    info!("Closing database connections");
    pool.dispose().await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
