//! Database configuration
//!
//! Pool sizing for the PostgreSQL store. `DATABASE_MAX_CONNECTIONS`,
//! `DATABASE_MIN_CONNECTIONS` and `DATABASE_ACQUIRE_TIMEOUT_SECS` override the
//! defaults.

use anyhow::{ensure, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::environment::parse_or;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
        }
    }

    pub fn from_env(url: impl Into<String>) -> Result<Self> {
        let defaults = Self::new(url);
        let config = Self {
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_or("DATABASE_MIN_CONNECTIONS", defaults.min_connections)?,
            acquire_timeout: Duration::from_secs(parse_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )?),
            ..defaults
        };
        ensure!(config.max_connections > 0, "DATABASE_MAX_CONNECTIONS must be positive");
        ensure!(
            config.min_connections <= config.max_connections,
            "DATABASE_MIN_CONNECTIONS exceeds DATABASE_MAX_CONNECTIONS"
        );
        Ok(config)
    }

    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_keeps_defaults_when_unset() {
        let config = DatabaseConfig::from_env("postgres://localhost/fleet").unwrap();
        assert_eq!(config.url, "postgres://localhost/fleet");
        assert!(config.min_connections <= config.max_connections);
    }
}
