//! Sync service configuration.
//!
//! Configuration is loaded once from environment variables at startup. The
//! source location, destination location and expected audience are
//! mandatory; any missing or invalid value is a fatal startup error.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Google's published JWKS endpoint for identity tokens.
pub const DEFAULT_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Issuers Google writes into identity tokens.
pub const DEFAULT_TOKEN_ISSUERS: &[&str] = &["https://accounts.google.com", "accounts.google.com"];

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS refresh interval in seconds (1 hour).
pub const DEFAULT_JWKS_REFRESH_SECONDS: u64 = 3600;

/// Default request timeout in seconds. Syncs of large buckets are slow.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 900;

/// Default rclone executable.
pub const DEFAULT_RCLONE_BINARY: &str = "rclone";

/// Default rclone remote name for both locations.
pub const DEFAULT_RCLONE_REMOTE: &str = "gcs-src";

/// Sync service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source location identifier (bucket or bucket/prefix).
    pub source: String,

    /// Destination location identifier (bucket or bucket/prefix).
    pub destination: String,

    /// Audience that inbound identity tokens must be issued for.
    pub audience: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// URL of the JWKS document used to verify identity tokens.
    pub jwks_url: String,

    /// How far a token's `iat` may lie in the future, in seconds.
    pub jwt_clock_skew_seconds: i64,

    /// Accepted `iss` claim values.
    pub token_issuers: Vec<String>,

    /// Whether the `aud` claim must equal `audience`.
    pub enforce_audience: bool,

    /// Seconds between JWKS refreshes. Zero disables refreshing.
    pub jwks_refresh_seconds: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Path or name of the rclone executable.
    pub rclone_binary: String,

    /// rclone remote name used for both locations.
    pub rclone_remote: String,

    /// Seconds to wait after a shutdown signal before exiting.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid token issuer configuration: {0}")]
    InvalidTokenIssuers(String),

    #[error("Invalid boolean for {name}: {value}")]
    InvalidBool { name: String, value: String },

    #[error("Invalid integer for {name}: {reason}")]
    InvalidInteger { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let source = required(vars, "GCS_SRC")?;
        let destination = required(vars, "GCS_DEST")?;
        let audience = required(vars, "AUDIENCE")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwks_url = vars
            .get("JWKS_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_JWKS_URL.to_string());

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value < 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not be negative, got {}",
                    value
                )));
            }

            if value > MAX_CLOCK_SKEW.as_secs() as i64 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs() as i64
        };

        let token_issuers = match vars.get("TOKEN_ISSUERS") {
            Some(value_str) => {
                let issuers: Vec<String> = value_str
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect();
                if issuers.is_empty() {
                    return Err(ConfigError::InvalidTokenIssuers(
                        "TOKEN_ISSUERS must list at least one issuer".to_string(),
                    ));
                }
                issuers
            }
            None => DEFAULT_TOKEN_ISSUERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        let enforce_audience = parse_bool(vars, "ENFORCE_AUDIENCE", true)?;

        let jwks_refresh_seconds =
            parse_u64(vars, "JWKS_REFRESH_SECONDS", DEFAULT_JWKS_REFRESH_SECONDS)?;

        let request_timeout_seconds = parse_u64(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?;
        if request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidInteger {
                name: "REQUEST_TIMEOUT_SECONDS".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let rclone_binary = vars
            .get("RCLONE_BINARY")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RCLONE_BINARY.to_string());

        let rclone_remote = vars
            .get("RCLONE_REMOTE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RCLONE_REMOTE.to_string());

        let drain_seconds = parse_u64(vars, "DRAIN_SECONDS", 0)?;

        Ok(Config {
            source,
            destination,
            audience,
            bind_address,
            jwks_url,
            jwt_clock_skew_seconds,
            token_issuers,
            enforce_audience,
            jwks_refresh_seconds,
            request_timeout_seconds,
            rclone_binary,
            rclone_remote,
            drain_seconds,
        })
    }
}

/// Required variables must be present and non-empty.
fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_bool(
    vars: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                name: name.to_string(),
                value: value.clone(),
            }),
        },
    }
}

fn parse_u64(vars: &HashMap<String, String>, name: &str, default: u64) -> Result<u64, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e| ConfigError::InvalidInteger {
            name: name.to_string(),
            reason: format!("expected a non-negative integer, got '{}': {}", value, e),
        }),
    }
}
