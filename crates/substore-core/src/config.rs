//! Per-run deployment configuration
//!
//! The record is assembled from operator input on every invocation and is
//! never persisted by the tool; nginx, certbot and docker hold the state.

use crate::constants::{API_PATH_PREFIX, API_PATH_RANDOM_LEN, DATA_DIR, DEFAULT_PORT};
use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::path::PathBuf;

static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9.-]*[a-zA-Z0-9]$").expect("domain pattern is valid")
});

const API_PATH_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Characters that would break the generated shell scripts
const API_PATH_FORBIDDEN: &[char] = &['"', '\'', '`', '$', '\\', ';', '&', '|', '<', '>'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub domain: String,
    pub port: u16,
    pub api_path: String,
    pub data_dir: PathBuf,
    pub email: Option<String>,
}

impl DeployConfig {
    /// Build a configuration from already-validated parts.
    ///
    /// `api_path` is normalized so it always starts with `/`.
    pub fn new(domain: &str, port: u16, api_path: &str) -> ConfigResult<Self> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port.to_string()));
        }
        Ok(Self {
            domain: validate_domain(domain)?,
            port,
            api_path: normalize_api_path(api_path)?,
            data_dir: PathBuf::from(DATA_DIR),
            email: None,
        })
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    /// Public URL the container advertises for its backend
    pub fn api_url(&self) -> String {
        format!("https://{}{}", self.domain, self.api_path)
    }
}

/// Check a hostname against the accepted pattern, returning it trimmed
pub fn validate_domain(input: &str) -> ConfigResult<String> {
    let domain = input.trim();
    if DOMAIN_PATTERN.is_match(domain) {
        Ok(domain.to_string())
    } else {
        Err(ConfigError::InvalidDomain(domain.to_string()))
    }
}

/// Parse the port prompt answer; empty input means the default port
pub fn parse_port(input: &str) -> ConfigResult<u16> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_PORT);
    }
    match trimmed.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(trimmed.to_string())),
    }
}

/// Prepend the leading slash when missing
pub fn normalize_api_path(input: &str) -> ConfigResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return Err(ConfigError::InvalidApiPath(
            trimmed.to_string(),
            "path must not be empty".to_string(),
        ));
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| c.is_whitespace() || API_PATH_FORBIDDEN.contains(c))
    {
        return Err(ConfigError::InvalidApiPath(
            trimmed.to_string(),
            format!("character '{}' is not allowed", c),
        ));
    }

    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{}", trimmed))
    }
}

/// Generate `/api-` followed by 32 random alphanumeric characters.
///
/// The path doubles as a shared secret, so it is regenerated on every run
/// that does not supply one.
pub fn generate_api_path() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..API_PATH_RANDOM_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..API_PATH_CHARSET.len());
            API_PATH_CHARSET[idx] as char
        })
        .collect();
    format!("{}{}", API_PATH_PREFIX, suffix)
}
