//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{DomainError, DomainResult};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,

    /// Per-query deadline in seconds
    pub query_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 20)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 2)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    /// - `DB_QUERY_TIMEOUT`: Per-query timeout in seconds (default: 5)
    ///
    /// # Errors
    ///
    /// Returns a validation error if `DATABASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_env_with_url(None)
    }

    /// Like [`DatabaseConfig::from_env`], but an explicit `database_url`
    /// takes precedence and `DATABASE_URL` is only required without one.
    pub fn from_env_with_url(database_url: Option<String>) -> DomainResult<Self> {
        let database_url = match database_url {
            Some(url) => url,
            None => env::var("DATABASE_URL")
                .map_err(|_| DomainError::validation("DATABASE_URL must be set"))?,
        };

        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 20)?,
            min_connections: env_or("DB_MIN_CONNECTIONS", 2)?,
            connection_timeout_secs: env_or("DB_CONNECTION_TIMEOUT", 10)?,
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT", 600)?,
            max_lifetime_secs: env_or("DB_MAX_LIFETIME", 1800)?,
            query_timeout_secs: env_or("DB_QUERY_TIMEOUT", 5)?,
        })
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/tournaments` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/tournaments".to_string(),
            max_connections: 20,
            min_connections: 2,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            query_timeout_secs: 5,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> DomainResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| DomainError::validation(format!("{key} has an invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 7] = [
        "DATABASE_URL",
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_CONNECTION_TIMEOUT",
        "DB_IDLE_TIMEOUT",
        "DB_MAX_LIFETIME",
        "DB_QUERY_TIMEOUT",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: tests touching the environment are serialized
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_url() {
        clear_env();
        assert!(DatabaseConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_explicit_url_without_env() {
        clear_env();
        // SAFETY: tests touching the environment are serialized
        unsafe { env::set_var("DB_MAX_CONNECTIONS", "7") };

        let config =
            DatabaseConfig::from_env_with_url(Some("postgres://admin@db/cli".to_string()))
                .unwrap();
        assert_eq!(config.database_url, "postgres://admin@db/cli");
        assert_eq!(config.max_connections, 7);

        // SAFETY: tests touching the environment are serialized
        unsafe { env::set_var("DATABASE_URL", "postgres://localhost/env") };
        let config =
            DatabaseConfig::from_env_with_url(Some("postgres://admin@db/cli".to_string()))
                .unwrap();
        assert_eq!(config.database_url, "postgres://admin@db/cli");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_and_overrides() {
        clear_env();
        // SAFETY: tests touching the environment are serialized
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/test");
            env::set_var("DB_QUERY_TIMEOUT", "2");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/test");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.query_timeout(), Duration::from_secs(2));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        // SAFETY: tests touching the environment are serialized
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/test");
            env::set_var("DB_MAX_CONNECTIONS", "lots");
        }

        let err = DatabaseConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
        clear_env();
    }

    #[test]
    fn test_development_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.query_timeout_secs, 5);
    }
}
