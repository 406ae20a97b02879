//! Server configuration module
//! Handles deployment-time parameters for the auth core

use crate::constants::{
    DEFAULT_CREDENTIAL_CACHE_TTL_SECS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SESSION_TTL_SECS,
    DEFAULT_TOKEN_TTL_SECS,
};
use crate::error::{RepogateError, Result};
use std::env;
use std::time::Duration;

/// Auth core configuration parameters
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub host: String,
    pub port: u16,
    /// HMAC key for token signing/verification
    pub signing_key: String,
    /// Path to the credentials document (user -> password spec, groups, email)
    pub credentials_file: Option<String>,
    /// Path to the permission rule document (path/method patterns -> permissions)
    pub permission_rules_file: Option<String>,
    /// Path to the per-user permission document (user -> permission list)
    pub user_permissions_file: Option<String>,
    /// Out-of-band single identity (name, password)
    pub env_user: Option<(String, String)>,
    /// Staleness window for the credential file cache
    pub credential_cache_ttl: Duration,
    /// Default token lifetime when the login request does not pick one
    pub token_ttl: Duration,
    /// Dashboard session lifetime
    pub session_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        panic!("AuthConfig::default() is not allowed for security reasons. Use AuthConfig::from_env() instead.");
    }
}

impl AuthConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            signing_key: "unit-test-signing-key-0123456789-never-in-production".to_string(),
            credentials_file: None,
            permission_rules_file: None,
            user_permissions_file: None,
            env_user: None,
            credential_cache_ttl: Duration::from_secs(DEFAULT_CREDENTIAL_CACHE_TTL_SECS),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Validate that the signing key meets security requirements
    fn validate_signing_key(key: &str) -> Result<()> {
        if key.len() < 32 {
            return Err(RepogateError::ConfigError(
                "signing key must be at least 32 characters long".to_string(),
            ));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if key.contains(pattern) {
                return Err(RepogateError::ConfigError(format!(
                    "signing key contains insecure pattern '{}'. Generate one with: openssl rand -hex 32",
                    pattern
                )));
            }
        }

        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = env::var("REPOGATE_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("REPOGATE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let signing_key = env::var("REPOGATE_SIGNING_KEY").map_err(|_| {
            RepogateError::ConfigError(
                "REPOGATE_SIGNING_KEY environment variable is required. \
                 Generate one with: openssl rand -hex 32"
                    .to_string(),
            )
        })?;
        Self::validate_signing_key(&signing_key)?;

        let credentials_file = env::var("REPOGATE_CREDENTIALS_FILE").ok();
        let permission_rules_file = env::var("REPOGATE_PERMISSION_RULES_FILE").ok();
        let user_permissions_file = env::var("REPOGATE_USER_PERMISSIONS_FILE").ok();

        // A configured env identity must carry both halves
        let env_user = match (
            env::var("REPOGATE_ENV_USER").ok(),
            env::var("REPOGATE_ENV_PASSWORD").ok(),
        ) {
            (Some(name), Some(password)) => Some((name, password)),
            (Some(name), None) => {
                return Err(RepogateError::ConfigError(format!(
                    "REPOGATE_ENV_USER '{}' is set but REPOGATE_ENV_PASSWORD is missing",
                    name
                )));
            }
            _ => None,
        };

        let credential_cache_ttl = env::var("REPOGATE_CREDENTIAL_CACHE_TTL_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_CREDENTIAL_CACHE_TTL_SECS);

        let token_ttl = env::var("REPOGATE_TOKEN_TTL_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        let session_ttl = env::var("REPOGATE_SESSION_TTL_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        Ok(Self {
            host,
            port,
            signing_key,
            credentials_file,
            permission_rules_file,
            user_permissions_file,
            env_user,
            credential_cache_ttl: Duration::from_secs(credential_cache_ttl),
            token_ttl: Duration::from_secs(token_ttl),
            session_ttl: Duration::from_secs(session_ttl),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "AuthConfig::default() is not allowed for security reasons")]
    fn test_default_panics() {
        let _ = AuthConfig::default();
    }

    #[test]
    fn test_for_testing_works_in_tests() {
        let config = AuthConfig::for_testing();
        assert!(config.signing_key.contains("unit-test"));
    }

    #[test]
    fn test_short_signing_key_rejected() {
        let result = AuthConfig::validate_signing_key("short");
        assert!(result.is_err());
    }

    #[test]
    fn test_insecure_signing_key_rejected() {
        let result =
            AuthConfig::validate_signing_key("change-this-change-this-change-this-change-this");
        assert!(result.is_err());
    }
}
