//! Error types for the persistence layer
//!
//! None of these reach the caller of `sync()` or `save()`; they flow through
//! the internal helpers with `?` and are dropped at the public boundary.

use thiserror::Error;

/// Failure reported by a storage medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage medium is unavailable")]
    Unavailable,

    #[error("quota exceeded writing {key}: need {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("host storage error: {message}")]
    Host { message: String },
}

/// Failure turning a value into its stored text or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Custom { message: String },
}

impl CodecError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message() {
        let err = StorageError::QuotaExceeded {
            key: "k".to_string(),
            needed: 12,
            quota: 8,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded writing k: need 12 bytes, quota is 8"
        );
    }

    #[test]
    fn test_codec_error_converts() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: PersistError = CodecError::from(json_err).into();
        assert!(matches!(err, PersistError::Codec(CodecError::Json(_))));
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
