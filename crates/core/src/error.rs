//! Core error types

use thiserror::Error;

/// Core error type for service bootstrap
#[derive(Debug, Error)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An environment override carried a value that does not parse
    #[error("Invalid value {value:?} for {var}")]
    InvalidOverride { var: String, value: String },

    /// Logging subscriber could not be installed
    #[error("Logging init failed: {0}")]
    Logging(String),
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
