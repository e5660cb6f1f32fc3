//! Error types for the supply proxy
//!
//! Upstream failures are normalized into a single message before they reach
//! the HTTP layer, which renders them as plain text.

use thiserror::Error;

/// Fallback message when the upstream gives nothing usable
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Raw failure talking to the chain API node
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network or connection failure reaching the node
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a structured error descriptor
    #[error("{code} - {name} - {what}")]
    Application { code: i64, name: String, what: String },

    /// Non-success status without a structured descriptor
    #[error("Upstream responded with status {status}")]
    Status { status: u16, message: Option<String> },

    /// Success status, but the body could not be decoded
    #[error("Malformed upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Message shown to API callers.
    ///
    /// Priority: structured descriptor, then the node's generic message
    /// (or the transport error text), then [`UNKNOWN_ERROR`].
    pub fn message(&self) -> String {
        let message = match self {
            UpstreamError::Application { .. } => self.to_string(),
            UpstreamError::Status { message, .. } => message.clone().unwrap_or_default(),
            UpstreamError::Transport(e) => e.to_string(),
            UpstreamError::Decode(_) => self.to_string(),
        };

        if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }
}

/// Normalized chain query failure; displays as the caller-facing message only
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ChainQueryError {
    pub message: String,
}

impl ChainQueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<UpstreamError> for ChainQueryError {
    fn from(e: UpstreamError) -> Self {
        Self::new(e.message())
    }
}

/// Token amount that cannot be held at the requested precision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Value times 10^decimals does not fit the 96-bit mantissa
    #[error("Amount {value} cannot be represented with {decimals} decimal places")]
    Precision { value: String, decimals: u32 },

    #[error("Amount arithmetic overflow")]
    Overflow,
}

/// Failures while deriving supply figures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupplyError {
    /// Stats query for the total supply failed
    #[error("{0}")]
    Query(#[from] ChainQueryError),

    /// Stats response had no entry for the configured symbol
    #[error("Unknown Supply Response")]
    UnknownSupply,

    /// Excluded-balance fan-out or reduction failed
    #[error("{0}")]
    Calculation(String),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
