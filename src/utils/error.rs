//! Error types for the balita harvester
//!
//! This module defines the domain error types used throughout the crate.

use thiserror::Error;

/// Errors that can occur during a single page retrieval attempt
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Host refused the request (403/429)
    #[error("Rate limited or blocked: HTTP {0}")]
    RateLimited(u16),

    /// Page does not exist (404/410)
    #[error("Not found: HTTP {0}")]
    NotFound(u16),

    /// Unexpected status code
    #[error("Unexpected status: HTTP {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Rendered page never showed any of the expected elements
    #[error("Page not ready after {waited_ms} ms")]
    NotReady { waited_ms: u64 },

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-specific failure (browser driver, scripted transport, ...)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Whether another attempt may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::InvalidUrl(_))
    }

    /// Whether the host asked us to slow down
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Errors that can occur during content extraction
#[derive(Error, Debug)]
pub enum ParseError {
    /// A configured CSS selector does not parse
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A boilerplate marker does not compile to a pattern
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No body locator matched a node with paragraph text
    #[error("Content not found in article")]
    ContentNotFound,

    /// Body text was found but is shorter than the length gate
    #[error("Content too short: {chars} chars (minimum {min})")]
    TooShort { chars: usize, min: usize },
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown built-in source profile
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    /// A profile or config value is out of range
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// Failed to read a config file
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML file
    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
