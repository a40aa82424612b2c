use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BucketName, CannedAcl, ObjectKey};

/// Caller-facing options for opening a write stream.
///
/// Only the content headers and `acl` reach the backend. `aliases`,
/// `metadata` and any unrecognized key are accepted so callers can hand over
/// the framework's option bag as-is, then dropped during normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOptions {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    #[serde(alias = "ACL")]
    pub acl: Option<CannedAcl>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(flatten)]
    pub unrecognized: BTreeMap<String, serde_json::Value>,
}

impl WriteOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_acl(mut self, acl: CannedAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    /// Names of the options normalization will drop
    pub fn dropped_fields(&self) -> Vec<&str> {
        let mut dropped = Vec::new();
        if !self.aliases.is_empty() {
            dropped.push("aliases");
        }
        if !self.metadata.is_empty() {
            dropped.push("metadata");
        }
        dropped.extend(self.unrecognized.keys().map(String::as_str));
        dropped
    }
}

/// Parameters of a put-object request, named the way S3 names them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutObjectParams {
    pub bucket: BucketName,
    pub key: ObjectKey,
    #[serde(rename = "ACL")]
    pub acl: CannedAcl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
}

impl PutObjectParams {
    /// Merge caller options over the store defaults; caller values win.
    pub fn normalize(
        bucket: &BucketName,
        key: ObjectKey,
        default_acl: CannedAcl,
        options: WriteOptions,
    ) -> Self {
        let dropped = options.dropped_fields();
        if !dropped.is_empty() {
            tracing::debug!(key = %key, ?dropped, "Dropping unsupported write options");
        }

        Self {
            bucket: bucket.clone(),
            key,
            acl: options.acl.unwrap_or(default_acl),
            content_type: options.content_type,
            cache_control: options.cache_control,
            content_disposition: options.content_disposition,
            content_encoding: options.content_encoding,
            content_language: options.content_language,
        }
    }
}
