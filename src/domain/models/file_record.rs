use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::value_objects::StoreName, ports::records::FileRecord};

/// What a store recorded about its copy of a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    /// Key the copy was written under, without the store prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// File name as stored, when it differs from the record's name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A file record as the framework hands it to stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub collection_name: String,
    #[serde(default)]
    pub copies: BTreeMap<StoreName, StoreInfo>,
}

impl StoredFile {
    /// Create a record with a freshly generated id and no stored copies
    pub fn new(collection_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.into(),
            collection_name: collection_name.into(),
            copies: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Record (or replace) what `store` knows about its copy
    pub fn record_copy(&mut self, store: StoreName, info: StoreInfo) {
        self.copies.insert(store, info);
    }
}

impl FileRecord for StoredFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn store_info(&self, store: &StoreName) -> Option<&StoreInfo> {
        self.copies.get(store)
    }
}
