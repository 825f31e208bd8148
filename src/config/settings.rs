//! Application settings loaded from environment variables.
//!
//! Environment variables (usually supplied through `.env` via `dotenvy`):
//! - `PORT` - HTTP listen port (default 3001)
//! - `JWT_SECRET` - HMAC secret for bearer tokens (required)
//! - `TOKEN_EXPIRY_SECS` - token lifetime, defaults to one hour
//! - `CONFIG_PATH` - seed file location (default `config.toml`)

use crate::errors::{Error, Result};

/// Runtime settings shared through the application state.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listen port
    pub port: u16,
    /// Secret used to sign and verify bearer tokens
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds
    pub token_expiry_secs: i64,
    /// Path to the seed config file
    pub config_path: String,
}

impl Settings {
    /// Loads settings from the environment.
    ///
    /// # Errors
    /// Returns a configuration error if `JWT_SECRET` is missing or a numeric
    /// variable fails to parse.
    pub fn load() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| Error::Config {
                message: format!("PORT is not a valid port number: {value}"),
            })?,
            Err(_) => 3001,
        };

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| Error::Config {
            message: "JWT_SECRET must be set".to_string(),
        })?;

        let token_expiry_secs = match std::env::var("TOKEN_EXPIRY_SECS") {
            Ok(value) => value.parse().map_err(|_| Error::Config {
                message: format!("TOKEN_EXPIRY_SECS is not a valid duration: {value}"),
            })?,
            Err(_) => 3600,
        };

        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        Ok(Self {
            port,
            jwt_secret,
            token_expiry_secs,
            config_path,
        })
    }
}
