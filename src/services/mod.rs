pub mod key_resolver;
pub mod retrying_reader;
mod s3_file_store;

pub use key_resolver::{KeyContext, KeyFn, KeyResolver};
pub use retrying_reader::read_with_retry;
pub use s3_file_store::S3FileStore;
