/// The "folder" prepended to every key a store writes.
///
/// Normalized so it never starts with `/` and, when non-empty, always ends
/// with exactly one `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    pub fn new(folder: Option<&str>) -> Self {
        let trimmed = folder
            .unwrap_or_default()
            .trim_start_matches('/')
            .trim_end_matches('/');

        if trimmed.is_empty() {
            Self(String::new())
        } else {
            Self(format!("{}/", trimmed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
