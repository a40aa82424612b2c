use crate::domain::{models::StoreInfo, value_objects::StoreName};

/// Read access to a file record owned by the surrounding framework
pub trait FileRecord: Send + Sync {
    fn id(&self) -> &str;

    /// Generic display name of the file
    fn name(&self) -> &str;

    fn collection_name(&self) -> &str;

    /// What `store` recorded about its copy, if anything
    fn store_info(&self, store: &StoreName) -> Option<&StoreInfo>;

    /// File name as kept by `store`, when it recorded a non-empty one
    fn name_in_store(&self, store: &StoreName) -> Option<&str> {
        self.store_info(store)
            .and_then(|info| info.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Key previously assigned by `store`, when it recorded a non-empty one
    fn recorded_key(&self, store: &StoreName) -> Option<&str> {
        self.store_info(store)
            .and_then(|info| info.key.as_deref())
            .filter(|key| !key.is_empty())
    }
}
