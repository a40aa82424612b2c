use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    adapters::outbound::storage::{ObjectStoreBackend, S3Config},
    domain::{
        errors::{ConfigError, ValidationError},
        models::ReadOptions,
        value_objects::{BucketName, CannedAcl, KeyPrefix, StoreName},
    },
    ports::{storage::ObjectBackend, stores::FileStore},
    services::{KeyFn, KeyResolver, S3FileStore},
};

/// Object-storage client a store persists into
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Process-local memory, for development and tests
    InMemory,
    /// An S3-compatible service
    S3(S3Config),
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::S3(S3Config::default())
    }
}

/// Everything needed to build one S3 file store
#[derive(Clone, bon::Builder)]
pub struct StoreConfig {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub bucket: Option<String>,
    /// Folder prepended to every key
    #[builder(into)]
    pub folder: Option<String>,
    #[builder(default)]
    pub default_acl: CannedAcl,
    pub key_fn: Option<KeyFn>,
    #[builder(default)]
    pub read_options: ReadOptions,
    #[builder(default)]
    pub backend: StorageBackend,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("name", &self.name)
            .field("bucket", &self.bucket)
            .field("folder", &self.folder)
            .field("default_acl", &self.default_acl)
            .field("key_fn", &self.key_fn.as_ref().map(|_| "<fn>"))
            .field("read_options", &self.read_options)
            .field("backend", &self.backend)
            .finish()
    }
}

/// Build a store from its configuration.
///
/// Every configuration problem surfaces here, before the store exists.
pub fn create_store(config: StoreConfig) -> Result<S3FileStore, ConfigError> {
    let name = StoreName::new(config.name)?;

    let bucket = config
        .bucket
        .filter(|bucket| !bucket.is_empty())
        .ok_or_else(|| ConfigError::MissingBucket {
            store: name.to_string(),
        })?;
    let bucket = BucketName::new(bucket)?;

    let backend: Arc<dyn ObjectBackend> = match config.backend {
        StorageBackend::InMemory => Arc::new(ObjectStoreBackend::in_memory(bucket)),
        StorageBackend::S3(s3_config) => {
            let resolved = s3_config.resolve()?;
            Arc::new(ObjectStoreBackend::s3(bucket, &resolved)?)
        }
    };

    S3FileStore::builder()
        .name(name)
        .backend(backend)
        .prefix(KeyPrefix::new(config.folder.as_deref()))
        .default_acl(config.default_acl)
        .key_resolver(KeyResolver::from_key_fn(config.key_fn))
        .read_options(config.read_options)
        .build()
}

/// Read a store configuration from environment variables
pub fn store_config_from_env(name: &str) -> Result<StoreConfig, ConfigError> {
    store_config_from_lookup(name, |var| {
        std::env::var(var).ok().filter(|value| !value.is_empty())
    })
}

/// Read a store configuration through `lookup`.
///
/// Recognized variables: `STORAGE_BACKEND` (`s3` or `memory`), `S3_BUCKET`,
/// `S3_FOLDER`, `S3_ACL`, `S3_READ_TRIES`, `S3_READ_TRY_FREQ_MS`,
/// `S3_ENDPOINT`, `S3_REGION`, `S3_ACCESS_KEY`, `S3_SECRET_KEY`,
/// `S3_SESSION_TOKEN`, `S3_ALLOW_HTTP`. Connection values left unset here
/// still fall back to the standard `AWS_*` variables when the client is built.
pub fn store_config_from_lookup<F>(name: &str, lookup: F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let backend = match lookup("STORAGE_BACKEND").as_deref() {
        None | Some("s3") => StorageBackend::S3(S3Config {
            endpoint: lookup("S3_ENDPOINT"),
            region: lookup("S3_REGION"),
            access_key_id: lookup("S3_ACCESS_KEY"),
            secret_access_key: lookup("S3_SECRET_KEY"),
            session_token: lookup("S3_SESSION_TOKEN"),
            allow_http: parse_flag(lookup("S3_ALLOW_HTTP")),
            ..Default::default()
        }),
        Some("memory") => StorageBackend::InMemory,
        Some(other) => {
            return Err(ValidationError::InvalidField {
                field: "STORAGE_BACKEND".to_string(),
                value: other.to_string(),
                expected: "s3 or memory".to_string(),
            }
            .into())
        }
    };

    let default_acl = match lookup("S3_ACL") {
        Some(acl) => acl.parse::<CannedAcl>()?,
        None => CannedAcl::default(),
    };

    let tries = match lookup("S3_READ_TRIES") {
        Some(value) => parse_number("S3_READ_TRIES", &value)?,
        None => ReadOptions::DEFAULT_TRIES,
    };
    let try_freq = match lookup("S3_READ_TRY_FREQ_MS") {
        Some(value) => Duration::from_millis(parse_number("S3_READ_TRY_FREQ_MS", &value)?),
        None => ReadOptions::DEFAULT_TRY_FREQ,
    };

    Ok(StoreConfig {
        name: name.to_string(),
        bucket: lookup("S3_BUCKET"),
        folder: lookup("S3_FOLDER"),
        default_acl,
        key_fn: None,
        read_options: ReadOptions::new(tries, try_freq)?,
        backend,
    })
}

fn parse_flag(value: Option<String>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
        expected: "a non-negative integer".to_string(),
    })
}

/// Stores known to the framework, by store name
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: BTreeMap<StoreName, Arc<dyn FileStore>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under its own name
    pub fn register(&mut self, store: Arc<dyn FileStore>) -> Result<(), ConfigError> {
        let name = store.name().clone();
        if self.stores.contains_key(&name) {
            return Err(ConfigError::DuplicateStore(name.to_string()));
        }

        tracing::info!(store = %name, store_type = store.type_name(), "Registered store");
        self.stores.insert(name, store);
        Ok(())
    }

    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Result<Self, ConfigError> {
        self.register(store)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FileStore>> {
        self.stores.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &StoreName> {
        self.stores.keys()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.stores
                    .iter()
                    .map(|(name, store)| (name.as_str(), store.type_name())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn memory_config(name: &str) -> StoreConfig {
        StoreConfig::builder()
            .name(name)
            .bucket("uploads")
            .backend(StorageBackend::InMemory)
            .build()
    }

    #[test]
    fn test_create_in_memory_store() {
        let store = create_store(memory_config("images")).unwrap();
        assert_eq!(store.name().as_str(), "images");
        assert_eq!(store.type_name(), "s3");
        assert_eq!(store.bucket().as_str(), "uploads");
    }

    #[test]
    fn test_public_default_acl_needs_s3_backend() {
        let s3 = StoreConfig::builder()
            .name("images")
            .bucket("uploads")
            .default_acl(CannedAcl::PublicRead)
            .backend(StorageBackend::S3(
                S3Config::builder()
                    .region("us-east-1")
                    .endpoint("http://localhost:9000")
                    .access_key_id("minioadmin")
                    .secret_access_key("minioadmin")
                    .allow_http(true)
                    .build(),
            ))
            .build();
        assert_eq!(create_store(s3).unwrap().default_acl(), CannedAcl::PublicRead);

        let mut memory = memory_config("images");
        memory.default_acl = CannedAcl::PublicRead;
        assert!(matches!(
            create_store(memory),
            Err(ConfigError::UnsupportedAcl { .. })
        ));
    }

    #[test]
    fn test_missing_bucket_is_fatal() {
        let config = StoreConfig::builder()
            .name("images")
            .backend(StorageBackend::InMemory)
            .build();

        match create_store(config) {
            Err(ConfigError::MissingBucket { store }) => assert_eq!(store, "images"),
            other => panic!("Expected MissingBucket, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_bucket_is_fatal() {
        let config = StoreConfig::builder()
            .name("images")
            .bucket("Not_A_Bucket")
            .backend(StorageBackend::InMemory)
            .build();

        assert!(matches!(create_store(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = store_config_from_lookup(
            "images",
            env(&[
                ("STORAGE_BACKEND", "memory"),
                ("S3_BUCKET", "uploads"),
                ("S3_FOLDER", "/media/"),
                ("S3_READ_TRIES", "5"),
                ("S3_READ_TRY_FREQ_MS", "250"),
            ]),
        )
        .unwrap();

        assert!(matches!(config.backend, StorageBackend::InMemory));
        assert_eq!(config.bucket.as_deref(), Some("uploads"));
        assert_eq!(config.read_options.tries(), 5);
        assert_eq!(config.read_options.try_freq(), Duration::from_millis(250));

        let store = create_store(config).unwrap();
        assert_eq!(store.prefix().as_str(), "media/");
    }

    #[test]
    fn test_config_from_lookup_s3_values() {
        let config = store_config_from_lookup(
            "images",
            env(&[
                ("S3_BUCKET", "uploads"),
                ("S3_REGION", "eu-central-1"),
                ("S3_ALLOW_HTTP", "true"),
                ("S3_ACL", "private"),
            ]),
        )
        .unwrap();

        match config.backend {
            StorageBackend::S3(s3) => {
                assert_eq!(s3.region.as_deref(), Some("eu-central-1"));
                assert!(s3.allow_http);
            }
            other => panic!("Expected S3 backend, got {:?}", other),
        }
    }

    #[test]
    fn test_config_from_lookup_rejects_bad_values() {
        let err = store_config_from_lookup("images", env(&[("STORAGE_BACKEND", "ftp")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = store_config_from_lookup("images", env(&[("S3_ACL", "everyone")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ValidationError::UnknownAcl(_))
        ));

        let err =
            store_config_from_lookup("images", env(&[("S3_READ_TRIES", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ValidationError::ZeroTries)));
    }

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let first = Arc::new(create_store(memory_config("images")).unwrap());
        let second = Arc::new(create_store(memory_config("images")).unwrap());
        let third = Arc::new(create_store(memory_config("thumbs")).unwrap());

        let mut registry = StoreRegistry::new().with_store(first).unwrap();
        assert!(matches!(
            registry.register(second),
            Err(ConfigError::DuplicateStore(name)) if name == "images"
        ));
        registry.register(third).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.names().map(StoreName::as_str).collect::<Vec<_>>(),
            vec!["images", "thumbs"]
        );
        assert_eq!(registry.get("thumbs").unwrap().type_name(), "s3");
        assert!(registry.get("missing").is_none());
    }
}
