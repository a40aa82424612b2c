pub mod file_record;
pub mod read_options;
pub mod write_options;

pub use file_record::{StoreInfo, StoredFile};
pub use read_options::ReadOptions;
pub use write_options::{PutObjectParams, WriteOptions};
