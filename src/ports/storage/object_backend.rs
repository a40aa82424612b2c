use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncWrite;

use crate::domain::{
    errors::StorageResult,
    models::PutObjectParams,
    value_objects::{BucketName, CannedAcl, ObjectKey},
};

/// Stream of object bytes as the backend delivers them
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Writable side of an upload; the object is committed on `shutdown`
pub type ObjectWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Where a backend read starts and which object version it must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadRequest {
    /// Byte offset to start from; 0 reads the whole object
    pub offset: u64,
    /// Only read if the object's ETag still equals this value
    pub if_match: Option<String>,
}

impl ReadRequest {
    pub fn from_start() -> Self {
        Self::default()
    }

    pub fn resume(offset: u64, if_match: Option<String>) -> Self {
        Self { offset, if_match }
    }
}

/// An opened backend read
pub struct ObjectRead {
    pub e_tag: Option<String>,
    /// Size of the whole object, not of the requested range
    pub size: Option<u64>,
    pub stream: ByteStream,
}

impl std::fmt::Debug for ObjectRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRead")
            .field("e_tag", &self.e_tag)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Port for the object-storage client a store persists into.
///
/// Implementations are bound to a single bucket. Errors are reported as the
/// backend produced them; nothing here retries.
#[async_trait]
pub trait ObjectBackend: Send + Sync + 'static {
    /// Bucket every call operates on
    fn bucket(&self) -> &BucketName;

    /// Short backend name used in diagnostics
    fn backend_name(&self) -> &str;

    /// Whether `acl` can be applied to objects written through this backend
    fn supports_acl(&self, acl: CannedAcl) -> bool {
        acl == CannedAcl::Private
    }

    /// Open a byte stream over `key`, starting at `request.offset`
    async fn open_read(&self, key: &ObjectKey, request: ReadRequest) -> StorageResult<ObjectRead>;

    /// Open a writer that stores an object with the given parameters
    async fn open_write(&self, params: PutObjectParams) -> StorageResult<ObjectWriter>;

    /// Delete the object at `key`
    async fn delete(&self, key: &ObjectKey) -> StorageResult<()>;
}
