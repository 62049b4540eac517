//! Configuration handling for the session server.
//!
//! Server and pool settings come from CLI arguments with environment fallbacks.
//! Database connection parameters are loaded separately by
//! [`ConnectionConfig`](crate::models::ConnectionConfig).

use clap::Parser;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8000;

// Pool configuration defaults
pub const DEFAULT_POOL_SIZE: u32 = 5;
pub const DEFAULT_MAX_OVERFLOW: u32 = 10;
pub const DEFAULT_POOL_RECYCLE_SECS: u64 = 3600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Connections kept open in the pool between units of work
    pub pool_size: u32,
    /// Extra connections allowed under load, closed as soon as they are released
    pub max_overflow: u32,
    /// Maximum connection age before it is closed and replaced
    pub recycle: Duration,
    /// How long `acquire` waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_MAX_OVERFLOW,
            recycle: Duration::from_secs(DEFAULT_POOL_RECYCLE_SECS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl PoolSettings {
    /// Upper bound on concurrently checked-out connections.
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    /// Validate pool settings and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("pool_size must be greater than 0".to_string());
        }
        if self.recycle.is_zero() {
            return Err("pool recycle interval must be greater than 0".to_string());
        }
        if self.acquire_timeout.is_zero() {
            return Err("acquire timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the session server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-session-server",
    about = "Login endpoint backed by a pooled, transactional database session manager",
    version,
    author
)]
pub struct Config {
    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "APP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "APP_HTTP_PORT")]
    pub http_port: u16,

    /// Connections kept open in the pool
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "APP_POOL_SIZE")]
    pub pool_size: u32,

    /// Extra connections allowed beyond the pool size
    #[arg(long, default_value_t = DEFAULT_MAX_OVERFLOW, env = "APP_MAX_OVERFLOW")]
    pub max_overflow: u32,

    /// Maximum connection age in seconds before it is replaced
    #[arg(long, default_value_t = DEFAULT_POOL_RECYCLE_SECS, env = "APP_POOL_RECYCLE")]
    pub pool_recycle: u64,

    /// Seconds to wait for a free connection before failing the request
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS, env = "APP_POOL_TIMEOUT")]
    pub pool_timeout: u64,

    /// Optional limit in seconds for a single unit of work
    #[arg(long, env = "APP_SESSION_TIMEOUT")]
    pub session_timeout: Option<u64>,

    /// SQL run by the login endpoint, with the user and password bound as parameters 1 and 2
    #[arg(long, env = "APP_LOGIN_QUERY")]
    pub login_query: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "APP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "APP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            pool_size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_MAX_OVERFLOW,
            pool_recycle: DEFAULT_POOL_RECYCLE_SECS,
            pool_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            session_timeout: None,
            login_query: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Build and validate the pool settings.
    pub fn pool_settings(&self) -> Result<PoolSettings, String> {
        let settings = PoolSettings {
            pool_size: self.pool_size,
            max_overflow: self.max_overflow,
            recycle: Duration::from_secs(self.pool_recycle),
            acquire_timeout: Duration::from_secs(self.pool_timeout),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Unit-of-work limit, if configured. Zero disables it.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_settings_defaults() {
        let settings = PoolSettings::default();
        assert_eq!(settings.pool_size, 5);
        assert_eq!(settings.max_overflow, 10);
        assert_eq!(settings.recycle, Duration::from_secs(3600));
        assert_eq!(settings.acquire_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_connections(), 15);
    }

    #[test]
    fn test_pool_settings_validation_pool_size_zero() {
        let settings = PoolSettings {
            pool_size: 0,
            ..PoolSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.contains("pool_size"));
    }

    #[test]
    fn test_pool_settings_validation_zero_timeout() {
        let settings = PoolSettings {
            acquire_timeout: Duration::ZERO,
            ..PoolSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_pool_settings_zero_overflow_is_valid() {
        let settings = PoolSettings {
            max_overflow: 0,
            ..PoolSettings::default()
        };
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_connections(), 5);
    }

    #[test]
    fn test_config_parse_defaults() {
        let config = Config::try_parse_from(["db-session-server"]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.pool_settings().unwrap(), PoolSettings::default());
        assert!(config.session_timeout().is_none());
        assert!(config.login_query.is_none());
    }

    #[test]
    fn test_config_parse_pool_flags() {
        let config = Config::try_parse_from([
            "db-session-server",
            "--pool-size",
            "2",
            "--max-overflow",
            "0",
            "--pool-timeout",
            "5",
            "--session-timeout",
            "10",
        ])
        .unwrap();
        let settings = config.pool_settings().unwrap();
        assert_eq!(settings.max_connections(), 2);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.session_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_config_rejects_zero_pool_size() {
        let config = Config::try_parse_from(["db-session-server", "--pool-size", "0"]).unwrap();
        assert!(config.pool_settings().is_err());
    }

    #[test]
    fn test_session_timeout_zero_disables_limit() {
        let config = Config {
            session_timeout: Some(0),
            ..Config::default_config()
        };
        assert!(config.session_timeout().is_none());
    }
}
