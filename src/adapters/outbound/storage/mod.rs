// Infrastructure error conversions
pub mod error;

// Storage implementations
pub mod object_store_backend;

// Provider-specific client construction
pub mod s3;

// Re-export key types
pub use object_store_backend::ObjectStoreBackend;
pub use s3::{create_s3_store, AclClient, AclWriter, ResolvedS3Config, S3Clients, S3Config};
