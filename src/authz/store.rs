//! Per-user permission lookups

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{RepogateError, Result};

/// Answers "does user U hold permission P"
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn allowed(&self, user_id: &str, permission: &str) -> Result<bool>;
}

/// Permission store backed by a declarative per-user permission list.
///
/// Lookup is literal membership; there is no wildcard or hierarchy handling
/// at this layer. A `"*"` permission is just a string the document author
/// chose to grant.
pub struct StaticPermissionStore {
    grants: HashMap<String, HashSet<String>>,
}

impl StaticPermissionStore {
    pub fn new(grants: HashMap<String, HashSet<String>>) -> Self {
        Self { grants }
    }

    /// Store with no grants; every lookup answers false
    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let grants: HashMap<String, HashSet<String>> = serde_json::from_str(raw).map_err(|e| {
            RepogateError::ConfigError(format!("invalid user permission document: {}", e))
        })?;
        Ok(Self::new(grants))
    }

    /// Load the per-user permission document from disk (startup-time only)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RepogateError::StorageError(format!(
                "failed to read user permissions {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }
}

#[async_trait]
impl PermissionStore for StaticPermissionStore {
    async fn allowed(&self, user_id: &str, permission: &str) -> Result<bool> {
        Ok(self
            .grants
            .get(user_id)
            .map(|granted| granted.contains(permission))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_membership_lookup() {
        let store = StaticPermissionStore::from_json(
            r#"{"bob": ["users-write", "repo-read"], "alice": []}"#,
        )
        .unwrap();

        assert!(store.allowed("bob", "users-write").await.unwrap());
        assert!(!store.allowed("bob", "admin").await.unwrap());
        assert!(!store.allowed("alice", "users-write").await.unwrap());
        assert!(!store.allowed("nobody", "users-write").await.unwrap());
    }

    #[tokio::test]
    async fn test_wildcard_is_a_literal_string() {
        let store = StaticPermissionStore::from_json(r#"{"root": ["*"]}"#).unwrap();

        assert!(store.allowed("root", "*").await.unwrap());
        // "*" grants nothing beyond itself
        assert!(!store.allowed("root", "users-write").await.unwrap());
    }
}
