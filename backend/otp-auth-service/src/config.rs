//! Configuration management for the OTP auth service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use otp_auth_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("Listening on port {}", settings.server.port);
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub server: ServerSettings,
    pub sms: SmsSettings,
    pub policy: SessionPolicy,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            server: ServerSettings::from_env()?,
            sms: SmsSettings::from_env(),
            policy: SessionPolicy::from_env()?,
        })
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            acquire_timeout: parse_or("DATABASE_ACQUIRE_TIMEOUT", 5)?,
        })
    }
}

/// Redis cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub url: String,
    pub response_timeout: u64,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
            response_timeout: parse_or("REDIS_RESPONSE_TIMEOUT", 5)?,
        })
    }
}

/// Session token signing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            secret,
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "otp-auth".to_string()),
        })
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8080)?,
        })
    }
}

/// SMS gateway configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SmsSettings {
    /// Fast2SMS API key; `None` switches to the logging dispatcher
    pub api_key: Option<String>,
    pub base_url: String,
}

impl std::fmt::Debug for SmsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SmsSettings {
    fn from_env() -> Self {
        Self {
            api_key: env::var("FAST2SMS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("FAST2SMS_BASE_URL")
                .unwrap_or_else(|_| "https://www.fast2sms.com/dev/bulkV2".to_string()),
        }
    }
}

/// Timings and ceilings of the session lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionPolicy {
    pub otp_ttl_secs: u64,
    pub otp_length: usize,
    /// OTP requests allowed before issuance is suspended
    pub otp_rate_limit: u32,
    /// Rate counter lifetime, re-armed on every request
    pub otp_rate_window_secs: u64,
    pub token_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Treat a failing blacklist lookup as "not revoked"
    pub revocation_fail_open: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            otp_ttl_secs: 300,
            otp_length: 6,
            otp_rate_limit: 6,
            otp_rate_window_secs: 3600,
            token_ttl_secs: 24 * 3600,
            sweep_interval_secs: 3600,
            revocation_fail_open: false,
        }
    }
}

impl SessionPolicy {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let policy = Self {
            otp_ttl_secs: parse_or("OTP_TTL_SECS", defaults.otp_ttl_secs)?,
            otp_length: parse_or("OTP_LENGTH", defaults.otp_length)?,
            otp_rate_limit: parse_or("OTP_RATE_LIMIT", defaults.otp_rate_limit)?,
            otp_rate_window_secs: parse_or("OTP_RATE_WINDOW_SECS", defaults.otp_rate_window_secs)?,
            token_ttl_secs: parse_or("TOKEN_TTL_SECS", defaults.token_ttl_secs)?,
            sweep_interval_secs: parse_or(
                "BLACKLIST_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?,
            revocation_fail_open: parse_or("REVOCATION_FAIL_OPEN", defaults.revocation_fail_open)?,
        };

        if policy.otp_length == 0 || policy.otp_ttl_secs == 0 || policy.token_ttl_secs == 0 {
            bail!("OTP_LENGTH, OTP_TTL_SECS and TOKEN_TTL_SECS must be positive");
        }
        if policy.sweep_interval_secs == 0 {
            bail!("BLACKLIST_SWEEP_INTERVAL_SECS must be positive");
        }

        Ok(policy)
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_secs)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.otp_rate_window_secs)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
