//! Opaque request key identifying "the same load".

use std::fmt;
use std::sync::Arc;

/// Identifies one logical request. Jobs never inspect it; they only hand it
/// back to the owning registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey(Arc<str>);

impl JobKey {
    /// Create a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    /// Borrow the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
