use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, StreamExt};

use crate::{
    domain::{
        errors::{ConfigError, StorageError, StorageResult, ValidationError},
        models::{PutObjectParams, ReadOptions, WriteOptions},
        value_objects::{BucketName, CannedAcl, KeyPrefix, ObjectKey, StoreName},
    },
    ports::{
        records::FileRecord,
        storage::{ByteStream, ObjectBackend, ObjectWriter},
        stores::FileStore,
    },
    services::{key_resolver::KeyResolver, retrying_reader::read_with_retry},
};

/// File store persisting into an S3-compatible bucket
#[derive(Clone)]
pub struct S3FileStore {
    name: StoreName,
    backend: Arc<dyn ObjectBackend>,
    prefix: KeyPrefix,
    default_acl: CannedAcl,
    key_resolver: KeyResolver,
    read_options: ReadOptions,
}

#[bon::bon]
impl S3FileStore {
    /// Fails when the backend cannot apply `default_acl`.
    #[builder]
    pub fn new(
        name: StoreName,
        backend: Arc<dyn ObjectBackend>,
        #[builder(default)] prefix: KeyPrefix,
        #[builder(default)] default_acl: CannedAcl,
        #[builder(default)] key_resolver: KeyResolver,
        #[builder(default)] read_options: ReadOptions,
    ) -> Result<Self, ConfigError> {
        if !backend.supports_acl(default_acl) {
            return Err(ConfigError::UnsupportedAcl {
                acl: default_acl,
                backend: backend.backend_name().to_string(),
            });
        }

        tracing::info!(
            store = %name,
            bucket = %backend.bucket(),
            backend = backend.backend_name(),
            prefix = %prefix,
            acl = %default_acl,
            "Created S3 file store"
        );

        Ok(Self {
            name,
            backend,
            prefix,
            default_acl,
            key_resolver,
            read_options,
        })
    }
}

impl S3FileStore {
    /// Store type name reported to the framework
    pub const TYPE_NAME: &'static str = "s3";

    pub fn bucket(&self) -> &BucketName {
        self.backend.bucket()
    }

    pub fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    pub fn default_acl(&self) -> CannedAcl {
        self.default_acl
    }

    /// Full object key for a resolved key: prefix + key
    pub fn object_key(&self, key: &str) -> Result<ObjectKey, ValidationError> {
        ObjectKey::with_prefix(&self.prefix, key)
    }

    /// Parameters a write of `key` with `options` would send to the backend
    pub fn put_params(&self, key: &str, options: WriteOptions) -> StorageResult<PutObjectParams> {
        let object_key = self.object_key(key)?;
        Ok(PutObjectParams::normalize(
            self.backend.bucket(),
            object_key,
            self.default_acl,
            options,
        ))
    }

    fn unsupported_sync(operation: &str) -> StorageError {
        StorageError::unsupported(operation, "S3 stores do not support the sync option")
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    fn name(&self) -> &StoreName {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn resolve_key(&self, file: &dyn FileRecord) -> String {
        self.key_resolver.resolve_key(file, &self.name)
    }

    fn default_read_options(&self) -> ReadOptions {
        self.read_options
    }

    fn open_read_stream(&self, key: &str, options: ReadOptions) -> ByteStream {
        match self.object_key(key) {
            Ok(object_key) => read_with_retry(Arc::clone(&self.backend), object_key, options),
            Err(err) => stream::once(async move { Err(StorageError::from(err)) }).boxed(),
        }
    }

    async fn open_write_stream(
        &self,
        key: &str,
        options: WriteOptions,
    ) -> StorageResult<ObjectWriter> {
        let params = self.put_params(key, options)?;

        if !self.backend.supports_acl(params.acl) {
            return Err(StorageError::unsupported(
                "put_object",
                format!(
                    "ACL '{}' cannot be applied by the {} backend",
                    params.acl,
                    self.backend.backend_name()
                ),
            ));
        }

        tracing::debug!(
            store = %self.name,
            bucket = %params.bucket,
            key = %params.key,
            content_type = params.content_type.as_deref(),
            "Opening write stream"
        );

        self.backend.open_write(params).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let object_key = self.object_key(key)?;

        match self.backend.delete(&object_key).await {
            Ok(()) => {
                tracing::debug!(store = %self.name, key = %object_key, "Removed object");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(store = %self.name, key = %object_key, error = %err, "Failed to remove object");
                Err(err)
            }
        }
    }

    fn watch(&self) -> StorageResult<()> {
        Err(Self::unsupported_sync("watch"))
    }

    fn sync(&self) -> StorageResult<()> {
        Err(Self::unsupported_sync("sync"))
    }
}

impl std::fmt::Debug for S3FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3FileStore")
            .field("name", &self.name)
            .field("bucket", self.backend.bucket())
            .field("backend", &self.backend.backend_name())
            .field("prefix", &self.prefix)
            .field("default_acl", &self.default_acl)
            .field("key_resolver", &self.key_resolver)
            .field("read_options", &self.read_options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::ObjectStoreBackend;
    use crate::domain::models::StoredFile;

    fn store(folder: Option<&str>) -> S3FileStore {
        let backend = Arc::new(ObjectStoreBackend::in_memory(
            BucketName::new("uploads".to_string()).unwrap(),
        ));
        S3FileStore::builder()
            .name(StoreName::new("images").unwrap())
            .backend(backend)
            .prefix(KeyPrefix::new(folder))
            .build()
            .unwrap()
    }

    #[test]
    fn test_object_key_includes_prefix() {
        let store = store(Some("/media"));
        let file = StoredFile::new("photos", "cat.png").with_id("f1");

        let key = store.resolve_key(&file);
        assert_eq!(key, "photos/f1-cat.png");
        assert_eq!(
            store.object_key(&key).unwrap().as_str(),
            "media/photos/f1-cat.png"
        );
    }

    #[test]
    fn test_put_params_defaults() {
        let store = store(None);
        let params = store
            .put_params("photos/f1-cat.png", WriteOptions::default())
            .unwrap();

        assert_eq!(params.bucket.as_str(), "uploads");
        assert_eq!(params.key.as_str(), "photos/f1-cat.png");
        assert_eq!(params.acl, CannedAcl::Private);
        assert_eq!(params.content_type, None);
    }

    #[test]
    fn test_unsupported_default_acl_rejected() {
        let backend = Arc::new(ObjectStoreBackend::in_memory(
            BucketName::new("uploads".to_string()).unwrap(),
        ));
        let result = S3FileStore::builder()
            .name(StoreName::new("images").unwrap())
            .backend(backend)
            .default_acl(CannedAcl::PublicRead)
            .build();

        assert!(matches!(result, Err(ConfigError::UnsupportedAcl { .. })));
    }

    #[test]
    fn test_watch_and_sync_unsupported() {
        let store = store(None);
        assert!(matches!(
            store.watch(),
            Err(StorageError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            store.sync(),
            Err(StorageError::UnsupportedOperation { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_key_fails_read_without_backend_call() {
        let store = store(None);
        let results: Vec<_> = store
            .open_read_stream("/absolute", ReadOptions::default())
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(StorageError::ValidationError { .. })
        ));
    }
}
