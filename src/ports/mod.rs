pub mod records;
pub mod storage;
pub mod stores;

// Re-export all port traits for convenience
pub use records::FileRecord;
pub use storage::{ByteStream, ObjectBackend, ObjectRead, ObjectWriter, ReadRequest};
pub use stores::FileStore;
