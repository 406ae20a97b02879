//! Declarative permission-matching policy
//!
//! An ordered table of `{path pattern, method pattern} -> [permission...]`
//! rules. Patterns are full-string regex matches compiled once at load time;
//! every matching rule contributes, and the result is the union of their
//! permission lists.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{RepogateError, Result};

/// One rule of the permission table as it appears in configuration
#[derive(Debug, Deserialize)]
pub struct RawRule {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

struct PermissionRule {
    path: Regex,
    method: Regex,
    permissions: Vec<String>,
}

/// Maps an HTTP method + path to the set of permission names that admit it
pub struct PermissionPolicy {
    rules: Vec<PermissionRule>,
}

impl PermissionPolicy {
    /// Policy with no rules; every request yields an empty required set
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_rules(raw_rules: Vec<RawRule>) -> Result<Self> {
        let mut rules = Vec::with_capacity(raw_rules.len());
        for raw in raw_rules {
            rules.push(PermissionRule {
                path: compile_anchored(&raw.path)?,
                method: compile_anchored(&raw.method)?,
                permissions: raw.permissions,
            });
        }
        Ok(Self { rules })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let raw_rules: Vec<RawRule> = serde_json::from_str(raw)
            .map_err(|e| RepogateError::ConfigError(format!("invalid permission rules: {}", e)))?;
        Self::from_rules(raw_rules)
    }

    /// Load the rule table from a document on disk (startup-time only)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RepogateError::StorageError(format!(
                "failed to read permission rules {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Union of the permission lists of every rule matching the request.
    ///
    /// An empty result means no restriction is configured for this request
    /// shape; the authorization gate admits authenticated callers in that
    /// case (configuration decides coverage, not this method).
    pub fn required_permissions(&self, path: &str, method: &str) -> HashSet<String> {
        let mut required = HashSet::new();
        for rule in &self.rules {
            if rule.path.is_match(path) && rule.method.is_match(method) {
                required.extend(rule.permissions.iter().cloned());
            }
        }
        required
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Full-string matching, not substring search
fn compile_anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| RepogateError::ConfigError(format!("invalid pattern '{}': {}", pattern, e)))
}
