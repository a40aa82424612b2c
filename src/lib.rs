pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - value objects, models and errors
pub use domain::{
    // Value objects
    BucketName,
    CannedAcl,
    // Errors
    ConfigError,
    KeyPrefix,
    ObjectKey,
    // Models
    PutObjectParams,
    ReadOptions,
    StorageError,
    StorageResult,
    StoreInfo,
    StoreName,
    StoredFile,
    ValidationError,
    WriteOptions,
};

// Port types - interfaces to the framework and to object storage
pub use ports::{ByteStream, FileRecord, FileStore, ObjectBackend, ObjectRead, ObjectWriter, ReadRequest};

// Service implementations
pub use services::{read_with_retry, KeyContext, KeyFn, KeyResolver, S3FileStore};

// Store construction and registration
pub use app::{
    create_store, store_config_from_env, store_config_from_lookup, StorageBackend, StoreConfig,
    StoreRegistry,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{ObjectStoreBackend, S3Config};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_store, BucketName, CannedAcl, FileRecord, FileStore, ObjectKey, ReadOptions,
        S3Config, S3FileStore, StorageBackend, StorageError, StoreConfig, StoreName,
        StoreRegistry, StoredFile, WriteOptions,
    };
}
