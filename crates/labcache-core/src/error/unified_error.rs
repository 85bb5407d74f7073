//! UnifiedError trait implementation for LabCacheError

use super::types::{LabCacheError, UnifiedError};

impl UnifiedError for LabCacheError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "LABCACHE_CONFIG",
            Self::CorruptCache { .. } => "LABCACHE_CORRUPT_CACHE",
            Self::Io { .. } => "LABCACHE_IO",
            Self::Json { .. } => "LABCACHE_JSON",
            Self::InvalidInput { .. } => "LABCACHE_INVALID_INPUT",
            Self::Llm { .. } => "LABCACHE_LLM",
            Self::Storage { .. } => "LABCACHE_STORAGE",
            Self::NotFound { .. } => "LABCACHE_NOT_FOUND",
            Self::Disabled => "LABCACHE_DISABLED",
            Self::Cancelled => "LABCACHE_CANCELLED",
            Self::Other { .. } => "LABCACHE_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } => message,
            Self::CorruptCache { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::InvalidInput { message, .. } => message,
            Self::Llm { message, .. } => message,
            Self::Storage { message, .. } => message,
            Self::NotFound { message, .. } => message,
            Self::Disabled => "Pattern cache is disabled",
            Self::Cancelled => "Processing was cancelled",
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::CorruptCache { context, .. } => context.as_deref(),
            Self::Io { context, .. } => context.as_deref(),
            Self::Json { context, .. } => context.as_deref(),
            Self::InvalidInput { context, .. } => context.as_deref(),
            Self::Llm { context, .. } => context.as_deref(),
            Self::Storage { context, .. } => context.as_deref(),
            Self::NotFound { context, .. } => context.as_deref(),
            Self::Disabled | Self::Cancelled => None,
            Self::Other { context, .. } => context.as_deref(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Llm { .. } | Self::Io { .. })
    }
}
