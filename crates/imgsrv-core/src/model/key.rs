use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, Result};

/// Opaque primary key of a persisted entity
///
/// Keys are generated by the store on insert (UUIDv7 text) and are never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey(String);

impl EntityKey {
    /// Generate a fresh key
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an existing key, rejecting empty strings
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `key` is empty or whitespace.
    pub fn parse(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::EmptyKey.into());
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityKey {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        EntityKey::parse(value).map_err(|e| e.to_string())
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_unique() {
        let a = EntityKey::generate();
        let b = EntityKey::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(EntityKey::parse("").is_err());
        assert!(EntityKey::parse("   ").is_err());
        assert_eq!(EntityKey::parse("k-1").unwrap().as_str(), "k-1");
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        let result: std::result::Result<EntityKey, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
