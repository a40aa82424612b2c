use serde::Serialize;

use crate::domain::{errors::ValidationError, value_objects::KeyPrefix};

/// Maximum key length accepted by S3, in bytes
const MAX_KEY_LEN: usize = 1024;

/// A validated object key (path) in the bucket, prefix included
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > MAX_KEY_LEN {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: MAX_KEY_LEN,
            });
        }

        if let Some(c) = value.chars().find(char::is_ascii_control) {
            return Err(ValidationError::InvalidObjectKeyCharacter(c));
        }

        if value.starts_with('/') {
            return Err(ValidationError::ObjectKeyStartsWithSlash);
        }

        if value.ends_with('/') {
            return Err(ValidationError::ObjectKeyEndsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectKeyContainsDoubleSlash);
        }

        if let Some(segment) = value.split('/').find(|s| *s == "." || *s == "..") {
            return Err(ValidationError::ObjectKeyRelativeSegment(segment.to_string()));
        }

        // Every other character is stored as written, '#', '%' and spaces included
        Ok(Self(value))
    }

    /// Join a store prefix and a resolved key into a full object key
    pub fn with_prefix(prefix: &KeyPrefix, key: &str) -> Result<Self, ValidationError> {
        Self::new(format!("{}{}", prefix.as_str(), key))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the file name part of the key (everything after the last '/')
    pub fn file_name(&self) -> &str {
        self.0.rfind('/').map_or(&self.0, |idx| &self.0[idx + 1..])
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
