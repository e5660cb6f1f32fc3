//! Configuration management with validation and defaults
//!
//! Built once at startup (defaults, optional TOML file, CLI overrides) and
//! shared read-only with every component afterwards.

use crate::amount::MAX_DECIMALS;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Complete proxy configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub token: TokenConfig,
}

/// HTTP listener settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4001,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Chain API node the proxy forwards to
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Per-request timeout; `None` waits for the node indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://mainnet.eoscalgary.io/v1".to_string(),
            timeout_secs: None,
        }
    }
}

/// Token being reported on
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub contract: String,
    pub symbol: String,
    pub decimals: u32,
    /// Accounts holding non-circulating supply, subtracted in this order
    pub excluded_accounts: Vec<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            contract: "therealkarma".to_string(),
            symbol: "KARMA".to_string(),
            decimals: 4,
            excluded_accounts: vec![
                "therealkarma".to_string(),
                "karmaairdrop".to_string(),
                "karma4market".to_string(),
            ],
        }
    }
}

impl SupplyConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.upstream.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(format!(
                "upstream.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        if self.upstream.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "upstream.timeout_secs must be > 0 when set".to_string(),
            ));
        }

        if self.token.contract.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "token.contract must not be empty".to_string(),
            ));
        }

        let symbol = &self.token.symbol;
        if symbol.is_empty() || symbol.len() > 7 || !symbol.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidValue(format!(
                "token.symbol must be 1-7 uppercase letters, got '{}'",
                symbol
            )));
        }

        if self.token.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue(format!(
                "token.decimals must be <= {}",
                MAX_DECIMALS
            )));
        }

        let mut seen = HashSet::new();
        for account in &self.token.excluded_accounts {
            if account.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "token.excluded_accounts must not contain empty names".to_string(),
                ));
            }
            // A repeated account would be subtracted twice
            if !seen.insert(account.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "token.excluded_accounts lists '{}' more than once",
                    account
                )));
            }
        }

        Ok(())
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
