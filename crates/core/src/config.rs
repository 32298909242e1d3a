//! Configuration management for the encryption service.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `PWEX_*` environment overrides. Command-line flags are applied last by
//! the binary.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

/// Default gRPC listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";

pub const ENV_LISTEN_ADDR: &str = "PWEX_LISTEN_ADDR";
pub const ENV_LOG_LEVEL: &str = "PWEX_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "PWEX_LOG_FORMAT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PWEX_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP endpoint the gRPC listener binds to
    pub listen_addr: SocketAddr,
    /// Per-call deadline enforced by the server, in seconds
    pub request_timeout_secs: Option<u64>,
    /// Maximum in-flight calls on a single connection
    pub concurrency_limit_per_connection: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 50051)),
            request_timeout_secs: None,
            concurrency_limit_per_connection: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(CoreError::InvalidOverride {
                var: "log format".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing sections fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `PWEX_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> CoreResult<()> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary lookup; unset variables are skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_LISTEN_ADDR) {
            self.server.listen_addr = parse_override(ENV_LISTEN_ADDR, &value)?;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            self.server.request_timeout_secs =
                Some(parse_override(ENV_REQUEST_TIMEOUT_SECS, &value)?);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidOverride {
                    var: ENV_LOG_LEVEL.to_string(),
                    value,
                });
            }
            self.logging.level = value;
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = value.parse().map_err(|_| CoreError::InvalidOverride {
                var: ENV_LOG_FORMAT.to_string(),
                value: value.clone(),
            })?;
        }
        Ok(())
    }
}

fn parse_override<T: FromStr>(var: &str, value: &str) -> CoreResult<T> {
    value.trim().parse().map_err(|_| CoreError::InvalidOverride {
        var: var.to_string(),
        value: value.to_string(),
    })
}
