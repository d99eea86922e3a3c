//! Typed error handling for keyset paging
//!
//! This module provides an error type hierarchy that lets callers react to
//! specific failures instead of dealing with a generic `anyhow::Error`.
//!
//! # Error Categories
//!
//! - [`ArgumentError`]: Rejected paging arguments (counts, cursors)
//! - [`CursorError`]: Cursor tokens that cannot be decoded
//! - [`SortError`]: Invalid sort specifications
//! - [`ConfigError`]: Invalid or unreadable paging options
//!
//! Failures of the underlying data source are carried unchanged in
//! [`PagingError::Fetch`].
//!
//! # Example
//!
//! ```rust,ignore
//! match paginator.paginate(&source, &sort, &args).await {
//!     Ok(page) => render(page),
//!     Err(PagingError::InvalidArguments(ArgumentError::InvalidCursor { argument, .. })) => {
//!         println!("bad {} cursor", argument);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use serde::Serialize;

/// The main error type for the paging engine
#[derive(Debug, thiserror::Error)]
pub enum PagingError {
    /// The caller supplied invalid paging arguments
    #[error(transparent)]
    InvalidArguments(#[from] ArgumentError),

    /// The sort specification could not be built
    #[error(transparent)]
    Sort(#[from] SortError),

    /// Paging options are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data source failed; never retried or reinterpreted
    #[error(transparent)]
    Fetch(anyhow::Error),
}

/// Error response structure for protocol-level error payloads
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PagingError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PagingError::InvalidArguments(e) => e.error_code(),
            PagingError::Sort(_) => "INVALID_SORT",
            PagingError::Config(_) => "CONFIG_ERROR",
            PagingError::Fetch(_) => "FETCH_FAILED",
        }
    }

    /// Whether the error was caused by caller input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, PagingError::InvalidArguments(_))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            PagingError::InvalidArguments(ArgumentError::InvalidCursor {
                argument,
                cursor,
                source,
            }) => Some(serde_json::json!({
                "argument": argument,
                "cursor": cursor,
                "reason": source.to_string(),
            })),
            PagingError::InvalidArguments(ArgumentError::CountExceedsMaximum {
                argument,
                value,
                max,
            }) => Some(serde_json::json!({
                "argument": argument,
                "value": value,
                "max": max,
            })),
            PagingError::InvalidArguments(ArgumentError::NegativeCount { argument, value }) => {
                Some(serde_json::json!({ "argument": argument, "value": value }))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Argument Errors
// =============================================================================

/// Errors related to paging arguments
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    /// `first` or `last` was negative
    #[error("'{argument}' must not be negative (got {value})")]
    NegativeCount { argument: &'static str, value: i32 },

    /// `first` or `last` exceeds the configured maximum page size
    #[error("'{argument}' must not exceed {max} (got {value})")]
    CountExceedsMaximum {
        argument: &'static str,
        value: i32,
        max: usize,
    },

    /// Neither `first` nor `last` was given but boundaries are required
    #[error("either 'first' or 'last' must be specified")]
    MissingBoundary,

    /// `after` or `before` could not be decoded
    #[error("invalid '{argument}' cursor '{cursor}': {source}")]
    InvalidCursor {
        argument: &'static str,
        cursor: String,
        #[source]
        source: CursorError,
    },
}

impl ArgumentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ArgumentError::NegativeCount { .. } => "NEGATIVE_PAGE_SIZE",
            ArgumentError::CountExceedsMaximum { .. } => "PAGE_SIZE_EXCEEDED",
            ArgumentError::MissingBoundary => "PAGING_BOUNDARY_REQUIRED",
            ArgumentError::InvalidCursor { .. } => "INVALID_CURSOR",
        }
    }
}

// =============================================================================
// Cursor Errors
// =============================================================================

/// Errors produced while decoding a cursor token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token is not a validly encoded cursor
    #[error("invalid cursor format: {reason}")]
    InvalidFormat { reason: String },

    /// The token decoded to the wrong number of key values
    #[error("cursor holds {actual} values but the sort order has {expected} fields")]
    ArityMismatch { expected: usize, actual: usize },
}

impl CursorError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CursorError::InvalidFormat {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Sort Errors
// =============================================================================

/// Errors related to building a sort specification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    /// No sort fields were given
    #[error("a sort specification needs at least one field")]
    Empty,

    /// The same field name appears twice
    #[error("sort field '{name}' is listed more than once")]
    DuplicateField { name: String },

    /// The last field is not a unique tie-breaker
    #[error("the last sort field '{field}' must be a unique tie-breaker")]
    MissingTieBreaker { field: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to paging options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("failed to parse paging options{}: {message}", from_file(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("failed to read '{path}': {message}")]
    IoError { path: String, message: String },
}

fn from_file(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" from '{f}'"))
        .unwrap_or_default()
}
