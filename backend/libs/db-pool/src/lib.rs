//! Database connection pool management
//!
//! Pool sizing and timeouts come from `DB_*` environment variables; the
//! connection string from `DATABASE_URL`.

pub mod env_utils;

use env_utils::parse_env_or;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum DbConfigError {
    #[error("DATABASE_URL environment variable not set")]
    MissingUrl,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("DB_MIN_CONNECTIONS ({min}) exceeds DB_MAX_CONNECTIONS ({max})")]
    InvalidBounds { min: u32, max: u32 },
}

#[derive(Clone)]
pub struct DbConfig {
    pub service_name: String,
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl DbConfig {
    pub fn from_env(service_name: &str) -> Result<Self, DbConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or(DbConfigError::MissingUrl)?;
        let defaults = Self::default();

        let config = Self {
            service_name: service_name.to_string(),
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout_secs: parse_env_or(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            acquire_timeout_secs: parse_env_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            )?,
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs)?,
        };

        if config.min_connections > config.max_connections {
            return Err(DbConfigError::InvalidBounds {
                min: config.min_connections,
                max: config.max_connections,
            });
        }

        Ok(config)
    }

    pub fn log_config(&self) {
        info!(
            "Database Pool Configuration: \
             max_connections={}, min_connections={}, \
             connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
            self.max_connections,
            self.min_connections,
            self.connect_timeout_secs,
            self.acquire_timeout_secs,
            self.idle_timeout_secs,
            self.max_lifetime_secs
        );
    }
}

pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(
        "Creating database pool: service={}, max={}, min={}, acquire_timeout={}s",
        config.service_name,
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs,
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!(
                service = %config.service_name,
                "Database pool created and verified successfully"
            );
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(
                service = %config.service_name,
                error = %e,
                "Database connection verification failed"
            );
            Err(e)
        }
        Err(_) => {
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_VARS: [&str; 6] = [
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_CONNECT_TIMEOUT_SECS",
        "DB_ACQUIRE_TIMEOUT_SECS",
        "DB_IDLE_TIMEOUT_SECS",
        "DB_MAX_LIFETIME_SECS",
    ];

    fn clear_pool_vars() {
        for key in POOL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_config_from_env_defaults() {
        clear_pool_vars();
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");

        let config = DbConfig::from_env("instaclone-service").unwrap();
        assert_eq!(config.service_name, "instaclone-service");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.acquire_timeout_secs, 10);

        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial_test::serial]
    fn test_config_from_env_overrides() {
        clear_pool_vars();
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");
        std::env::set_var("DB_MAX_CONNECTIONS", "32");
        std::env::set_var("DB_MIN_CONNECTIONS", "4");

        let config = DbConfig::from_env("svc").unwrap();
        assert_eq!(config.max_connections, 32);
        assert_eq!(config.min_connections, 4);

        clear_pool_vars();
        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial_test::serial]
    fn test_config_requires_database_url() {
        clear_pool_vars();
        std::env::remove_var("DATABASE_URL");

        assert!(matches!(
            DbConfig::from_env("svc"),
            Err(DbConfigError::MissingUrl)
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_config_rejects_min_above_max() {
        clear_pool_vars();
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");
        std::env::set_var("DB_MAX_CONNECTIONS", "2");
        std::env::set_var("DB_MIN_CONNECTIONS", "5");

        assert!(matches!(
            DbConfig::from_env("svc"),
            Err(DbConfigError::InvalidBounds { min: 5, max: 2 })
        ));

        clear_pool_vars();
        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = DbConfig {
            database_url: "postgres://user:hunter2@db/prod".to_string(),
            ..DbConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }
}
