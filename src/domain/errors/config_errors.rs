use crate::domain::{errors::ValidationError, value_objects::CannedAcl};

/// Errors raised while constructing a store or its backend client
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Store '{store}' requires a bucket name")]
    MissingBucket { store: String },

    #[error("No region configured: set it explicitly or through AWS_REGION")]
    MissingRegion,

    #[error("Incomplete credentials: {present} is set but {missing} is not")]
    IncompleteCredentials {
        present: &'static str,
        missing: &'static str,
    },

    #[error("Unknown S3 client option '{0}'")]
    UnknownClientOption(String),

    #[error("ACL '{acl}' is not supported by the {backend} backend")]
    UnsupportedAcl { acl: CannedAcl, backend: String },

    #[error("Store '{0}' is already registered")]
    DuplicateStore(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Failed to build storage client: {message}")]
    Client { message: String },
}
