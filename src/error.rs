//! Unified error types for board-watch.
//!
//! One library-level error enum with kind sub-enums for the normalizer and
//! the temporal store, plus a context extension trait for building error
//! chains at call sites.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for board-watch operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BoardWatchError {
    /// Errors while turning a raw payload into a snapshot
    #[error("Failed to normalize board payload: {context}")]
    Normalize {
        context: String,
        #[source]
        source: NormalizeErrorKind,
    },

    /// Errors from the temporal store
    #[error("Storage operation failed: {context}")]
    Store {
        context: String,
        #[source]
        source: StoreErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific normalization error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NormalizeErrorKind {
    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },
}

/// Specific temporal-store error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreErrorKind {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("Invalid timestamp in column '{column}': {value}")]
    InvalidTimestamp { column: String, value: String },

    #[error("Detail payload could not be serialized: {0}")]
    DetailSerialization(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for board-watch operations
pub type Result<T> = std::result::Result<T, BoardWatchError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl BoardWatchError {
    /// Create a normalization error with context
    pub fn normalize(context: impl Into<String>, source: NormalizeErrorKind) -> Self {
        Self::Normalize {
            context: context.into(),
            source,
        }
    }

    /// Create a normalization error for a missing required field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::normalize(
            "missing required field",
            NormalizeErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create a store error with context
    pub fn store(context: impl Into<String>, source: StoreErrorKind) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for BoardWatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BoardWatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::normalize(
            "JSON deserialization",
            NormalizeErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<rusqlite::Error> for BoardWatchError {
    fn from(err: rusqlite::Error) -> Self {
        Self::store("sqlite", StoreErrorKind::Sqlite(err))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The added context is prepended to the error's existing context, creating
/// a chain that shows the path through the code.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BoardWatchError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: BoardWatchError, new_ctx: &str) -> BoardWatchError {
    match err {
        BoardWatchError::Normalize {
            context: existing,
            source,
        } => BoardWatchError::Normalize {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BoardWatchError::Store {
            context: existing,
            source,
        } => BoardWatchError::Store {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BoardWatchError::Io {
            path,
            message,
            source,
        } => BoardWatchError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        BoardWatchError::Config(msg) => BoardWatchError::Config(chain_context(new_ctx, &msg)),
        BoardWatchError::Validation(msg) => {
            BoardWatchError::Validation(chain_context(new_ctx, &msg))
        }
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
