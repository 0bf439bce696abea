//! Error types for Citree
//!
//! Provides the error taxonomy for a tree build:
//! - Lookup failures, absorbed by the fetcher and turned into defaulted records
//! - Persistence failures, which abort the build
//! - Export and configuration failures
//! - Error codes and process exit codes for the CLI

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidIdentifier,

    // Lookup errors (4xxx)
    PaperNotFound,
    UpstreamError,
    UpstreamTimeout,
    RateLimited,

    // Persistence errors (7xxx)
    SnapshotError,
    ExportError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidIdentifier => 1002,

            // Lookup (4xxx)
            ErrorCode::PaperNotFound => 4001,
            ErrorCode::UpstreamError => 4002,
            ErrorCode::UpstreamTimeout => 4003,
            ErrorCode::RateLimited => 4004,

            // Persistence (7xxx)
            ErrorCode::SnapshotError => 7001,
            ErrorCode::ExportError => 7002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid identifier: {id}")]
    InvalidIdentifier { id: String },

    // Lookup errors
    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("Upstream error for {id}: {message}")]
    Upstream { id: String, message: String },

    #[error("Unusable upstream response for {id}: {message}")]
    InvalidResponse { id: String, message: String },

    #[error("Upstream timeout for {id} after {timeout_ms}ms")]
    UpstreamTimeout { id: String, timeout_ms: u64 },

    #[error("Rate limited by upstream for {id}")]
    RateLimited { id: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Persistence errors
    #[error("Snapshot error at {path}: {message}")]
    Snapshot { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::InvalidResponse { .. } => ErrorCode::UpstreamError,
            AppError::UpstreamTimeout { .. } => ErrorCode::UpstreamTimeout,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Snapshot { .. } => ErrorCode::SnapshotError,
            AppError::Csv(_) => ErrorCode::ExportError,
            AppError::Template(_) => ErrorCode::ExportError,
            AppError::Io(_) => ErrorCode::InternalError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Process exit code for the CLI (sysexits-style)
    pub fn exit_code(&self) -> i32 {
        match self {
            // EX_USAGE / EX_DATAERR
            AppError::Validation { .. } | AppError::InvalidIdentifier { .. } => 65,

            // EX_UNAVAILABLE
            AppError::PaperNotFound { .. }
            | AppError::Upstream { .. }
            | AppError::InvalidResponse { .. }
            | AppError::UpstreamTimeout { .. }
            | AppError::RateLimited { .. }
            | AppError::HttpClient(_) => 69,

            // EX_CANTCREAT / EX_IOERR
            AppError::Snapshot { .. }
            | AppError::Csv(_)
            | AppError::Template(_) => 73,
            AppError::Io(_) => 74,

            // EX_CONFIG
            AppError::Configuration { .. } => 78,

            // EX_SOFTWARE
            AppError::Internal { .. } | AppError::Serialization(_) | AppError::Other(_) => 70,
        }
    }

    /// Whether a lookup that failed with this error is worth repeating.
    /// `Upstream` only carries 5xx answers; a response that arrived but
    /// could not be used is never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::UpstreamTimeout { .. } | AppError::RateLimited { .. } => true,
            AppError::HttpClient(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::Upstream { .. } => true,
            _ => false,
        }
    }

    /// Upstream asked us to slow down
    pub fn is_throttled(&self) -> bool {
        matches!(self, AppError::RateLimited { .. })
    }

    /// Whether this error must abort a running build
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::SnapshotError
                | ErrorCode::ExportError
                | ErrorCode::ConfigurationError
                | ErrorCode::InternalError
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
