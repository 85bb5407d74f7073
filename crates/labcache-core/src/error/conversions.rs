//! From trait implementations for LabCacheError conversions

use super::types::LabCacheError;

impl From<std::io::Error> for LabCacheError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for LabCacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<tokio::task::JoinError> for LabCacheError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::other(format!("Background task failed: {}", error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LabCacheError = io.into();
        assert_eq!(err.error_code(), "LABCACHE_IO");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: LabCacheError = json_err.into();
        assert_eq!(err.error_code(), "LABCACHE_JSON");
    }
}
