mod bucket_name;
mod canned_acl;
mod key_prefix;
mod object_key;
mod store_name;

pub use bucket_name::BucketName;
pub use canned_acl::CannedAcl;
pub use key_prefix::KeyPrefix;
pub use object_key::ObjectKey;
pub use store_name::StoreName;
