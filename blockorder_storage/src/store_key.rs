use derive_more::Display;
use thiserror::Error;

/// The key of a value in a store.
///
/// Keys are `/` separated paths. Every component is non-empty and uses only ASCII letters, digits, `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct StoreKey(String);

/// An invalid store key.
#[derive(Debug, Clone, Error)]
#[error("invalid store key {0}")]
pub struct StoreKeyError(String);

impl StoreKey {
    /// Check and wrap `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if [`StoreKey::validate()`] rejects `key`.
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if Self::validate(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `key` is a valid store key.
    #[must_use]
    pub fn validate(key: &str) -> bool {
        !key.is_empty()
            && key.split('/').all(|component| {
                !component.is_empty()
                    && component
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_key() {
        assert!(StoreKey::new("a/b/c.bin").is_ok());
        assert!(StoreKey::new("data_0-1").is_ok());
        assert!(StoreKey::new("").is_err());
        assert!(StoreKey::new("/a").is_err());
        assert!(StoreKey::new("a//b").is_err());
        assert!(StoreKey::new("a b").is_err());
        assert_eq!(StoreKey::new("a/b").unwrap().to_string(), "a/b");
    }
}
