/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),
    ObjectKeyStartsWithSlash,
    ObjectKeyEndsWithSlash,
    ObjectKeyContainsDoubleSlash,
    /// A `.` or `..` path segment
    ObjectKeyRelativeSegment(String),
    /// Key the storage client refuses as a path
    UnrepresentableObjectKey {
        key: String,
        reason: String,
    },

    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameConsecutivePeriods,
    BucketNameLooksLikeIpAddress,

    EmptyStoreName,
    InvalidStoreNameCharacter(char),

    UnknownAcl(String),
    ZeroTries,

    InvalidField {
        field: String,
        value: String,
        expected: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }
            ValidationError::ObjectKeyStartsWithSlash => {
                write!(f, "Object key cannot start with '/'")
            }
            ValidationError::ObjectKeyEndsWithSlash => {
                write!(f, "Object key cannot end with '/'")
            }
            ValidationError::ObjectKeyContainsDoubleSlash => {
                write!(f, "Object key cannot contain '//'")
            }
            ValidationError::ObjectKeyRelativeSegment(segment) => {
                write!(f, "Object key cannot contain a '{}' segment", segment)
            }
            ValidationError::UnrepresentableObjectKey { key, reason } => {
                write!(f, "Object key '{}' is not a valid storage path: {}", key, reason)
            }

            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, hyphens and periods allowed",
                    c
                )
            }
            ValidationError::BucketNameConsecutivePeriods => {
                write!(f, "Bucket name cannot contain consecutive periods")
            }
            ValidationError::BucketNameLooksLikeIpAddress => {
                write!(f, "Bucket name cannot be formatted as an IP address")
            }

            ValidationError::EmptyStoreName => write!(f, "Store name cannot be empty"),
            ValidationError::InvalidStoreNameCharacter(c) => {
                write!(f, "Invalid character in store name: {:?}", c)
            }

            ValidationError::UnknownAcl(value) => {
                write!(f, "Unknown canned ACL: '{}'", value)
            }
            ValidationError::ZeroTries => {
                write!(f, "Read tries must be at least 1")
            }

            ValidationError::InvalidField {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Invalid value for field '{}': '{}' (expected: {})",
                    field, value, expected
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
