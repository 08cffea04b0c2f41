//! Warehouse error types

use codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the storage layer
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Warehouse not connected")]
    NotConnected,

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema noncompliant at {path:?}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Cannot union {expected} with {found}")]
    UnionMismatch { expected: String, found: String },
}

impl WarehouseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if the stored bits themselves are at fault
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_corruption())
    }
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WarehouseError::schema("/data/BTC", "not a directory");
        assert_eq!(
            err.to_string(),
            "Schema noncompliant at \"/data/BTC\": not a directory"
        );

        let err = WarehouseError::UnionMismatch {
            expected: "BTC@1m".to_string(),
            found: "ETH@1m".to_string(),
        };
        assert!(err.to_string().contains("ETH@1m"));
    }

    #[test]
    fn test_data_error_classification() {
        let corrupt: WarehouseError = CodecError::corruption(3, "short", 10).into();
        assert!(corrupt.is_data_error());
        assert!(!WarehouseError::NotConnected.is_data_error());
    }
}
