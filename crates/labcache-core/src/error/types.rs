//! Core error types and traits for labcache

use thiserror::Error;

/// Result type alias for labcache operations
pub type LabCacheResult<T> = Result<T, LabCacheError>;

/// Unified error trait that all labcache errors implement.
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> LabCacheResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> LabCacheResult<T>;
}

impl<T> ResultExt<T> for LabCacheResult<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> LabCacheResult<T> {
        self.map_err(|e| e.with_context(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> LabCacheResult<T> {
        self.map_err(|e| e.with_context(f().to_string()))
    }
}

/// Main error type for labcache
#[derive(Error, Debug, Clone)]
pub enum LabCacheError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// A cache file exists but cannot be used (bad JSON, bad schema, newer version)
    #[error("Corrupt cache file {path}: {message}")]
    CorruptCache {
        path: String,
        message: String,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// Errors reported by the external extraction service
    #[error("LLM extraction error: {message}")]
    Llm {
        message: String,
        context: Option<String>,
    },

    /// Storage/persistence errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        context: Option<String>,
    },

    /// The cache is disabled by configuration
    #[error("Pattern cache is disabled")]
    Disabled,

    /// Processing was cancelled by the caller
    #[error("Processing was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
