use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::error::{RepogateError, Result};

/// How a stored secret is checked against a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordSpec {
    /// Exact string equality
    Plain(String),
    /// Candidate hashed with SHA-256 and compared to the stored hex digest
    Sha256(String),
    /// Validation happens remotely; never verifiable from the record itself
    Delegated,
}

/// Password field as it appears in a credentials document: either an explicit
/// `{ "type": ..., "value": ... }` pair or a colon-joined `"type:value"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawPassword {
    Spec {
        #[serde(rename = "type")]
        scheme: String,
        value: String,
    },
    Joined(String),
}

impl PasswordSpec {
    pub fn from_parts(scheme: &str, value: &str) -> Result<Self> {
        match scheme {
            "plain" => Ok(Self::Plain(value.to_string())),
            "sha256" => Ok(Self::Sha256(value.to_string())),
            other => Err(RepogateError::UnsupportedPasswordScheme(other.to_string())),
        }
    }

    pub fn from_raw(raw: RawPassword) -> Result<Self> {
        match raw {
            RawPassword::Spec { scheme, value } => Self::from_parts(&scheme, &value),
            RawPassword::Joined(joined) => {
                let (scheme, value) = joined.split_once(':').ok_or_else(|| {
                    RepogateError::InvalidCredentialsConfig(
                        "password string must be of the form '<type>:<value>'".to_string(),
                    )
                })?;
                Self::from_parts(scheme, value)
            }
        }
    }

    /// Checks a login candidate against this spec
    pub fn verify(&self, candidate: &str) -> bool {
        match self {
            Self::Plain(stored) => stored == candidate,
            Self::Sha256(digest) => {
                let candidate_digest = hex::encode(Sha256::digest(candidate.as_bytes()));
                candidate_digest.eq_ignore_ascii_case(digest)
            }
            Self::Delegated => false,
        }
    }
}

/// A resolved identity. Owned by whichever credential backend sourced it;
/// the auth core only reads it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub password: PasswordSpec,
    pub groups: HashSet<String>,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: String, password: PasswordSpec) -> Self {
        Self {
            id,
            password,
            groups: HashSet::new(),
            email: None,
        }
    }

    /// Identity whose password is checked by a remote provider
    pub fn delegated(id: String) -> Self {
        Self::new(id, PasswordSpec::Delegated)
    }

    pub fn validate_password(&self, candidate: &str) -> bool {
        self.password.verify(candidate)
    }

    pub fn groups(&self) -> &HashSet<String> {
        &self.groups
    }
}
