use crate::domain::errors::{ConfigError, StorageError};

/// Convert an object_store error raised while working on `key` in `bucket`
pub fn storage_error(err: object_store::Error, bucket: &str, key: &str) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::ObjectNotFound {
            key: key.to_string(),
        },
        object_store::Error::Precondition { .. } => StorageError::ObjectModified {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
            StorageError::UnsupportedOperation {
                operation: "object_store".to_string(),
                reason: err.to_string(),
            }
        }
        _ => StorageError::Backend {
            message: format!("'{}' in bucket '{}': {}", key, bucket, err),
            source: Some(err.to_string()),
        },
    }
}

/// Convert object_store errors raised while building a client
impl From<object_store::Error> for ConfigError {
    fn from(err: object_store::Error) -> Self {
        ConfigError::Client {
            message: err.to_string(),
        }
    }
}

/// Convert standard io::Error raised while streaming to or from a store
impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_key() {
        let err = object_store::Error::NotFound {
            path: "media/a.txt".to_string(),
            source: "missing".into(),
        };

        match storage_error(err, "uploads", "media/a.txt") {
            StorageError::ObjectNotFound { key } => assert_eq!(key, "media/a.txt"),
            other => panic!("Expected ObjectNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_precondition_means_modified() {
        let err = object_store::Error::Precondition {
            path: "media/a.txt".to_string(),
            source: "etag mismatch".into(),
        };

        assert!(matches!(
            storage_error(err, "uploads", "media/a.txt"),
            StorageError::ObjectModified { .. }
        ));
    }

    #[test]
    fn test_other_errors_name_bucket_and_key() {
        let err = object_store::Error::Generic {
            store: "S3",
            source: "connection reset".into(),
        };

        let converted = storage_error(err, "uploads", "media/a.txt");
        let message = converted.to_string();
        assert!(message.contains("uploads"));
        assert!(message.contains("media/a.txt"));
        assert!(message.contains("connection reset"));
    }
}
