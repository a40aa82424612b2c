use async_trait::async_trait;

use crate::{
    domain::{
        errors::StorageResult,
        models::{ReadOptions, WriteOptions},
        value_objects::StoreName,
    },
    ports::{
        records::FileRecord,
        storage::{ByteStream, ObjectWriter},
    },
};

/// A named persistence target as the file-storage framework drives it.
///
/// Keys passed to the stream and remove operations are the ones returned by
/// [`FileStore::resolve_key`]; the store adds its own prefix.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Name the store is registered under
    fn name(&self) -> &StoreName;

    /// Store type name, e.g. `"s3"`
    fn type_name(&self) -> &'static str;

    /// Key under which this store keeps `file`
    fn resolve_key(&self, file: &dyn FileRecord) -> String;

    /// Read options used when the caller has none of its own
    fn default_read_options(&self) -> ReadOptions {
        ReadOptions::default()
    }

    /// Stream the object stored under `key`.
    ///
    /// Returns immediately; the backend is contacted when the stream is
    /// first polled.
    fn open_read_stream(&self, key: &str, options: ReadOptions) -> ByteStream;

    /// Open a writer for the object stored under `key`
    async fn open_write_stream(&self, key: &str, options: WriteOptions)
        -> StorageResult<ObjectWriter>;

    /// Delete the object stored under `key`
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Watch the backend for external changes
    fn watch(&self) -> StorageResult<()>;

    /// Sync external changes back into the framework
    fn sync(&self) -> StorageResult<()>;
}
