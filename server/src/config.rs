//! Server configuration parsed from environment variables.
//!
//! `main` loads `.env` (if present) before calling [`Config::from_env`].
//! Every variable is optional; malformed numbers are rejected rather than
//! silently replaced by defaults.

use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// `hello`, `init` and `users` are queued back to back on join.
pub const MIN_CLIENT_CHANNEL_CAPACITY: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("CLIENT_CHANNEL_CAPACITY must be at least {min}, got {value}")]
    CapacityTooSmall { value: usize, min: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory served at `/`. `None` disables static hosting.
    pub static_dir: Option<PathBuf>,
    /// Outbound queue length per connection. A client that overflows it on
    /// anything but a move or resize is disconnected.
    pub client_channel_capacity: usize,
    pub log_filter: String,
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `HOST`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `STATIC_DIR`: default `public`; empty disables static hosting
    /// - `CLIENT_CHANNEL_CAPACITY`: default 256, minimum 3
    /// - `RUST_LOG`: default `info`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparseable numbers or a capacity too small
    /// to hold the join handshake.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        let static_dir = match lookup("STATIC_DIR") {
            Some(dir) if dir.trim().is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        };
        let client_channel_capacity =
            parse_var(&lookup, "CLIENT_CHANNEL_CAPACITY", DEFAULT_CLIENT_CHANNEL_CAPACITY)?;
        if client_channel_capacity < MIN_CLIENT_CHANNEL_CAPACITY {
            return Err(ConfigError::CapacityTooSmall {
                value: client_channel_capacity,
                min: MIN_CLIENT_CHANNEL_CAPACITY,
            });
        }
        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());

        Ok(Self { host, port, static_dir, client_channel_capacity, log_filter })
    }

    /// Socket address string for `TcpListener::bind`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
            client_channel_capacity: DEFAULT_CLIENT_CHANNEL_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
