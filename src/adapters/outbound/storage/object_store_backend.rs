use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::{
    buffered::BufWriter, memory::InMemory, path::Path as ObjectPath, Attribute, Attributes,
    GetOptions, GetRange, ObjectStore as ApacheObjectStore,
};
use std::sync::Arc;

use crate::{
    adapters::outbound::storage::{
        error::storage_error,
        s3::{create_s3_store, AclClient, AclWriter, ResolvedS3Config},
    },
    domain::{
        errors::{ConfigError, StorageError, StorageResult, ValidationError},
        models::PutObjectParams,
        value_objects::{BucketName, CannedAcl, ObjectKey},
    },
    ports::storage::{ObjectBackend, ObjectRead, ObjectWriter, ReadRequest},
};

/// Backend that implements our ObjectBackend port using Apache object_store
#[derive(Clone)]
pub struct ObjectStoreBackend {
    inner: Arc<dyn ApacheObjectStore>,
    bucket: BucketName,
    name: String,
    acl: Option<AclClient>,
}

impl ObjectStoreBackend {
    pub fn new(
        store: Arc<dyn ApacheObjectStore>,
        bucket: BucketName,
        name: impl Into<String>,
    ) -> Self {
        Self {
            inner: store,
            bucket,
            name: name.into(),
            acl: None,
        }
    }

    /// Apply non-private canned ACLs through `client` after each upload
    pub fn with_acl_client(mut self, client: AclClient) -> Self {
        self.acl = Some(client);
        self
    }

    /// Process-local backend for development and tests
    pub fn in_memory(bucket: BucketName) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket, "memory")
    }

    /// Backend talking to an S3-compatible service
    pub fn s3(bucket: BucketName, config: &ResolvedS3Config) -> Result<Self, ConfigError> {
        let clients = create_s3_store(&bucket, config)?;
        Ok(Self::new(clients.store, bucket, "s3").with_acl_client(clients.acl))
    }

    /// The wrapped object_store client
    pub fn inner(&self) -> &Arc<dyn ApacheObjectStore> {
        &self.inner
    }

    /// The key as stored, byte for byte
    fn path(key: &ObjectKey) -> StorageResult<ObjectPath> {
        ObjectPath::parse(key.as_str()).map_err(|e| {
            ValidationError::UnrepresentableObjectKey {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn attributes(params: &PutObjectParams) -> Attributes {
        let mut attributes = Attributes::new();
        let headers = [
            (Attribute::ContentType, &params.content_type),
            (Attribute::CacheControl, &params.cache_control),
            (Attribute::ContentDisposition, &params.content_disposition),
            (Attribute::ContentEncoding, &params.content_encoding),
            (Attribute::ContentLanguage, &params.content_language),
        ];

        for (attribute, value) in headers {
            if let Some(value) = value {
                attributes.insert(attribute, value.clone().into());
            }
        }
        attributes
    }
}

#[async_trait]
impl ObjectBackend for ObjectStoreBackend {
    fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    fn backend_name(&self) -> &str {
        &self.name
    }

    fn supports_acl(&self, acl: CannedAcl) -> bool {
        acl == CannedAcl::Private || self.acl.is_some()
    }

    async fn open_read(&self, key: &ObjectKey, request: ReadRequest) -> StorageResult<ObjectRead> {
        let path = Self::path(key)?;
        let options = GetOptions {
            range: (request.offset > 0).then_some(GetRange::Offset(request.offset)),
            if_match: request.if_match,
            ..Default::default()
        };

        let result = self
            .inner
            .get_opts(&path, options)
            .await
            .map_err(|e| storage_error(e, self.bucket.as_str(), key.as_str()))?;

        let e_tag = result.meta.e_tag.clone();
        let size = Some(result.meta.size);

        let bucket = self.bucket.to_string();
        let key = key.to_string();
        let stream = result
            .into_stream()
            .map_err(move |e| storage_error(e, &bucket, &key))
            .boxed();

        Ok(ObjectRead {
            e_tag,
            size,
            stream,
        })
    }

    async fn open_write(&self, params: PutObjectParams) -> StorageResult<ObjectWriter> {
        if params.bucket != self.bucket {
            return Err(StorageError::unsupported(
                "put_object",
                format!(
                    "backend is bound to bucket '{}', not '{}'",
                    self.bucket, params.bucket
                ),
            ));
        }

        if !self.supports_acl(params.acl) {
            return Err(StorageError::unsupported(
                "put_object",
                format!("ACL '{}' cannot be applied by the {} backend", params.acl, self.name),
            ));
        }

        let path = Self::path(&params.key)?;
        let writer = BufWriter::new(Arc::clone(&self.inner), path)
            .with_attributes(Self::attributes(&params));

        match (&self.acl, params.acl) {
            (Some(client), acl) if acl != CannedAcl::Private => Ok(Box::new(AclWriter::new(
                writer,
                client.clone(),
                params.key,
                acl,
            ))),
            _ => Ok(Box::new(writer)),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        let path = Self::path(key)?;

        self.inner
            .delete(&path)
            .await
            .map_err(|e| storage_error(e, self.bucket.as_str(), key.as_str()))
    }
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("store", &self.inner.to_string())
            .field("bucket", &self.bucket)
            .field("name", &self.name)
            .field("acl", &self.acl)
            .finish()
    }
}
