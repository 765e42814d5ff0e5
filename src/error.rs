//! Unified error handling for the balita crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`BalitaErrorTrait`] - recoverability and category, shared by every error type
//! - [`ErrorCategory`] - coarse grouping used when reporting failures
//! - [`Error`] - the crate-level error wrapping fetch, parse, config and output errors
//!
//! Errors inside a harvest never reach this type: failed pages and articles
//! are counted and skipped. What does surface is configuration, output I/O
//! and a run that collected nothing.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::utils::error::{ConfigError, FetchError, ParseError};

/// Common trait for all balita error types
pub trait BalitaErrorTrait: std::error::Error {
    /// Whether running the same operation again may succeed
    fn is_recoverable(&self) -> bool;

    fn category(&self) -> ErrorCategory;
}

/// Where a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport, status codes, rate limiting, empty harvests
    Network,
    /// Selectors, patterns, extraction
    Parsing,
    /// Dataset and stats files
    Storage,
    Config,
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Unified error type for the balita crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV writing/reading errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Every source failed and nothing was collected
    #[error("Harvest of '{source_name}' produced an empty dataset")]
    EmptyDataset { source_name: String },

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BalitaErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl BalitaErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl BalitaErrorTrait for ConfigError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Read { .. } => ErrorCategory::Storage,
            _ => ErrorCategory::Config,
        }
    }
}

impl BalitaErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
            Self::Config(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Csv(_) | Self::Json(_) => false,
            Self::EmptyDataset { .. } => true,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) | Self::EmptyDataset { .. } => ErrorCategory::Network,
            Self::Parse(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(e) => e.category(),
            Self::Io(_) | Self::Csv(_) => ErrorCategory::Storage,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Error carrying a message and the underlying cause
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let parse_err = Error::Parse(ParseError::ContentNotFound);
        assert_eq!(parse_err.category(), ErrorCategory::Parsing);

        let read_err = Error::Config(ConfigError::Read {
            path: "balita.toml".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        });
        assert_eq!(read_err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Fetch(FetchError::Timeout).is_recoverable());
        assert!(!Error::Fetch(FetchError::NotFound(404)).is_recoverable());
        assert!(!Error::Parse(ParseError::ContentNotFound).is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let unified: Error = ConfigError::UnknownSource("inquirer".into()).into();
        assert!(matches!(unified, Error::Config(_)));
        assert_eq!(unified.to_string(), "Config error: Unknown source 'inquirer'");
    }

    #[test]
    fn test_empty_dataset_message() {
        let err = Error::EmptyDataset {
            source_name: "pressone".into(),
        };
        assert_eq!(err.to_string(), "Harvest of 'pressone' produced an empty dataset");
        assert_eq!(err.category().to_string(), "network");
    }

    #[test]
    fn test_with_source_keeps_cause() {
        use std::error::Error as _;

        let cause = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::with_source("Failed to move dataset into place", cause);
        assert_eq!(err.category(), ErrorCategory::Other);
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Failed to move dataset into place");
        assert!(err.source().is_some());
    }
}
