//! Configuration errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid domain '{0}': must start and end with a letter or digit and contain only letters, digits, '.' and '-'")]
    InvalidDomain(String),

    #[error("Invalid port '{0}': expected a number between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid API path '{0}': {1}")]
    InvalidApiPath(String, String),
}

/// Result type alias for configuration parsing
pub type ConfigResult<T> = Result<T, ConfigError>;
