use std::sync::Arc;

use crate::{
    domain::{models::StoreInfo, value_objects::StoreName},
    ports::records::FileRecord,
};

/// What a key function gets to see besides the record itself
#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    pub store_name: &'a StoreName,
    pub info: Option<&'a StoreInfo>,
}

/// Caller-supplied key naming function; its result is used verbatim
pub type KeyFn = Arc<dyn Fn(&dyn FileRecord, &KeyContext<'_>) -> String + Send + Sync>;

/// Decides which key a file is stored under
#[derive(Clone, Default)]
pub struct KeyResolver {
    key_fn: Option<KeyFn>,
}

impl KeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_fn<F>(key_fn: F) -> Self
    where
        F: Fn(&dyn FileRecord, &KeyContext<'_>) -> String + Send + Sync + 'static,
    {
        Self {
            key_fn: Some(Arc::new(key_fn)),
        }
    }

    pub fn from_key_fn(key_fn: Option<KeyFn>) -> Self {
        Self { key_fn }
    }

    /// Resolve the key for `file` in `store_name`.
    ///
    /// A key already recorded for the store always wins, so a file keeps
    /// its key for as long as the record remembers it.
    pub fn resolve_key(&self, file: &dyn FileRecord, store_name: &StoreName) -> String {
        if let Some(key) = file.recorded_key(store_name) {
            return key.to_string();
        }

        if let Some(key_fn) = &self.key_fn {
            let context = KeyContext {
                store_name,
                info: file.store_info(store_name),
            };
            return key_fn(file, &context);
        }

        let file_name = file.name_in_store(store_name).unwrap_or(file.name());
        format!("{}/{}-{}", file.collection_name(), file.id(), file_name)
    }
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("key_fn", &self.key_fn.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StoredFile;

    fn store() -> StoreName {
        StoreName::new("images").unwrap()
    }

    fn photo() -> StoredFile {
        StoredFile::new("photos", "cat.png").with_id("f1")
    }

    #[test]
    fn test_default_convention() {
        let resolver = KeyResolver::new();
        assert_eq!(resolver.resolve_key(&photo(), &store()), "photos/f1-cat.png");
    }

    #[test]
    fn test_store_specific_name_preferred() {
        let mut file = photo();
        file.record_copy(
            store(),
            StoreInfo {
                name: Some("cat-thumb.png".to_string()),
                ..Default::default()
            },
        );

        let resolver = KeyResolver::new();
        assert_eq!(
            resolver.resolve_key(&file, &store()),
            "photos/f1-cat-thumb.png"
        );

        // Another store still uses the generic name
        let other = StoreName::new("originals").unwrap();
        assert_eq!(resolver.resolve_key(&file, &other), "photos/f1-cat.png");
    }

    #[test]
    fn test_recorded_key_wins_over_key_fn() {
        let mut file = photo();
        file.record_copy(
            store(),
            StoreInfo {
                key: Some("legacy/cat.png".to_string()),
                ..Default::default()
            },
        );

        let resolver = KeyResolver::with_key_fn(|_, _| "from-fn".to_string());
        assert_eq!(resolver.resolve_key(&file, &store()), "legacy/cat.png");
        assert_eq!(resolver.resolve_key(&file, &store()), "legacy/cat.png");
    }

    #[test]
    fn test_empty_recorded_key_is_ignored() {
        let mut file = photo();
        file.record_copy(
            store(),
            StoreInfo {
                key: Some(String::new()),
                ..Default::default()
            },
        );

        let resolver = KeyResolver::new();
        assert_eq!(resolver.resolve_key(&file, &store()), "photos/f1-cat.png");
    }

    #[test]
    fn test_key_fn_receives_context() {
        let mut file = photo();
        file.record_copy(
            store(),
            StoreInfo {
                size: Some(42),
                ..Default::default()
            },
        );

        let resolver = KeyResolver::with_key_fn(|file, ctx| {
            let size = ctx.info.and_then(|info| info.size).unwrap_or_default();
            format!("{}/{}/{}", ctx.store_name, size, file.id())
        });

        assert_eq!(resolver.resolve_key(&file, &store()), "images/42/f1");
    }

    #[test]
    fn test_key_fn_result_used_verbatim() {
        let resolver = KeyResolver::with_key_fn(|_, _| "//odd key//".to_string());
        assert_eq!(resolver.resolve_key(&photo(), &store()), "//odd key//");
    }
}
