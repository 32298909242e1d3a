//! Core functionality shared by the password-exchange services.
//!
//! This crate provides configuration loading, structured logging
//! initialisation and the core error type used by service entry points.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, LogFormat, LoggingConfig, ServerConfig, DEFAULT_LISTEN_ADDR};
pub use error::{CoreError, CoreResult};
