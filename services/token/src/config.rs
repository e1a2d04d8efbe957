//! Centralized configuration for the token core.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use crate::error::TokenError;
use crate::keys::KeyPaths;
use crate::observability::TracingConfig;
use crate::service::TokenProfile;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Largest clock leeway accepted.
pub const MAX_CLOCK_LEEWAY: Duration = Duration::from_secs(30);

const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Token core configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Observability
    /// Service name for logs
    pub service_name: String,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,

    // Tokens
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Clock skew tolerated past expiry
    pub clock_leeway: Duration,

    // Keys
    /// Key file locations
    pub key_paths: KeyPaths,
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is malformed or out of range.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_source(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is malformed or out of range.
    pub fn from_source<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name = lookup("SERVICE_NAME").unwrap_or_else(|| "token-core".to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = parse_var(&lookup, "LOG_JSON", false)?;

        let token_ttl = Duration::from_secs(parse_var(&lookup, "TOKEN_TTL_SECS", DEFAULT_TTL_SECS)?);
        if token_ttl.is_zero() {
            return Err(TokenError::config("TOKEN_TTL_SECS must be positive"));
        }

        let clock_leeway = Duration::from_secs(parse_var(&lookup, "TOKEN_CLOCK_LEEWAY_SECS", 0)?);
        if clock_leeway > MAX_CLOCK_LEEWAY {
            return Err(TokenError::config(format!(
                "TOKEN_CLOCK_LEEWAY_SECS must be at most {}",
                MAX_CLOCK_LEEWAY.as_secs()
            )));
        }

        let key_dir = PathBuf::from(lookup("KEY_DIR").unwrap_or_else(|| "keys".to_string()));
        let defaults = KeyPaths::in_dir(&key_dir);
        let path = |name: &str, default: PathBuf| lookup(name).map_or(default, PathBuf::from);
        let key_paths = KeyPaths {
            ed25519_private: path("ED25519_PRIVATE_KEY_FILE", defaults.ed25519_private),
            ed25519_public: path("ED25519_PUBLIC_KEY_FILE", defaults.ed25519_public),
            secret: path("LOCAL_SECRET_FILE", defaults.secret),
            rsa_private: path("RSA_PRIVATE_KEY_FILE", defaults.rsa_private),
            rsa_public: path("RSA_PUBLIC_KEY_FILE", defaults.rsa_public),
        };

        Ok(Self {
            service_name,
            log_level,
            log_json,
            token_ttl,
            clock_leeway,
            key_paths,
        })
    }

    /// Profiles for the four built-in purposes.
    #[must_use]
    pub fn profiles(&self) -> [TokenProfile; 4] {
        TokenProfile::defaults(self.token_ttl)
    }

    /// Tracing settings derived from this configuration.
    #[must_use]
    pub fn tracing(&self) -> TracingConfig {
        let config = TracingConfig::default()
            .with_service_name(&self.service_name)
            .with_log_level(&self.log_level);
        if self.log_json {
            config.with_json_output()
        } else {
            config
        }
    }
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
