use crate::domain::errors::ValidationError;

/// Errors that can occur during storage operations
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Object not found in the backend
    ObjectNotFound { key: String },

    /// Read attempts exhausted; carries the last backend failure
    ReadFailed {
        bucket: String,
        key: String,
        attempts: u32,
        message: String,
    },

    /// Object was replaced between two attempts of the same read
    ObjectModified { bucket: String, key: String },

    /// Operation not supported by this store or backend
    UnsupportedOperation { operation: String, reason: String },

    /// Validation error
    ValidationError { message: String },

    /// Error reported by the storage backend
    Backend {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },

    /// Local I/O error while streaming
    Io { message: String },
}

impl StorageError {
    /// Build an `UnsupportedOperation` error
    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::ObjectNotFound { .. })
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ObjectNotFound { key } => {
                write!(f, "Object not found: {}", key)
            }
            StorageError::ReadFailed {
                bucket,
                key,
                attempts,
                message,
            } => {
                write!(
                    f,
                    "Failed to read '{}' from bucket '{}' after {} attempt(s): {}",
                    key, bucket, attempts, message
                )
            }
            StorageError::ObjectModified { bucket, key } => {
                write!(
                    f,
                    "Object '{}' in bucket '{}' changed while it was being read",
                    key, bucket
                )
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::Backend { message, .. } => {
                write!(f, "Storage backend error: {}", message)
            }
            StorageError::Io { message } => {
                write!(f, "I/O error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
