//! Environment configuration
//!
//! Reads typed settings from the process environment (after `.env` has been
//! loaded by `dotenvy`). Anything optional falls back to a development default.

use anyhow::{ensure, Context, Result};
use std::env;
use std::str::FromStr;

/// Upper bound for any expiry look-ahead, in days
pub const MAX_EXPIRY_THRESHOLD_DAYS: i64 = 365;

/// Which backing store the repositories use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres(String),
    Memory,
}

/// Optional HTTP mail relay
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub storage: StorageBackend,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    pub mail: MailConfig,
    pub expiry_threshold_days: i64,
    pub expiry_check_interval_secs: u64,
    pub status_refresh_interval_secs: u64,
    pub allow_super_registration: bool,
    pub bcrypt_cost: u32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            storage: StorageBackend::Memory,
            redis_url: None,
            jwt_secret: "development-secret-change-me".to_string(),
            jwt_expiration: 86_400,
            cors_origins: Vec::new(),
            rate_limit_requests: 300,
            rate_limit_window: 60,
            mail: MailConfig {
                api_url: None,
                api_key: None,
                from: "no-reply@fleet.local".to_string(),
            },
            expiry_threshold_days: 30,
            expiry_check_interval_secs: 86_400,
            status_refresh_interval_secs: 3_600,
            allow_super_registration: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let is_production = environment == "production";

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if is_production => anyhow::bail!("JWT_SECRET must be set in production"),
            Err(_) => defaults.jwt_secret,
        };

        let storage = match optional("DATABASE_URL") {
            Some(url) => StorageBackend::Postgres(url),
            None => StorageBackend::Memory,
        };

        Ok(Self {
            port: parse_or("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            storage,
            redis_url: optional("REDIS_URL"),
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", defaults.jwt_expiration)?,
            cors_origins: optional("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_window: parse_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window)?,
            mail: MailConfig {
                api_url: optional("MAIL_API_URL"),
                api_key: optional("MAIL_API_KEY"),
                from: env::var("MAIL_FROM").unwrap_or(defaults.mail.from),
            },
            expiry_threshold_days: check_threshold_days(parse_or(
                "EXPIRY_THRESHOLD_DAYS",
                defaults.expiry_threshold_days,
            )?)?,
            expiry_check_interval_secs: parse_or(
                "EXPIRY_CHECK_INTERVAL_SECS",
                defaults.expiry_check_interval_secs,
            )?,
            status_refresh_interval_secs: parse_or(
                "STATUS_REFRESH_INTERVAL_SECS",
                defaults.status_refresh_interval_secs,
            )?,
            allow_super_registration: parse_or(
                "ALLOW_SUPER_REGISTRATION",
                defaults.allow_super_registration,
            )?,
            bcrypt_cost: parse_or("BCRYPT_COST", defaults.bcrypt_cost)?,
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn check_threshold_days(days: i64) -> Result<i64> {
    ensure!(
        (0..=MAX_EXPIRY_THRESHOLD_DAYS).contains(&days),
        "EXPIRY_THRESHOLD_DAYS must be between 0 and {}, got {}",
        MAX_EXPIRY_THRESHOLD_DAYS,
        days
    );
    Ok(days)
}

pub(crate) fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
