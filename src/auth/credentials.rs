//! Pluggable credential resolution
//!
//! A trait-based system for credential backends (declarative file, env-based
//! single identity, delegated remote identity) combined through a
//! first-match-wins chain.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::auth::user::{PasswordSpec, RawPassword, User};
use crate::error::{RepogateError, Result};

/// Trait for credential backends
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve a login name to a user record, if this backend knows it
    async fn resolve(&self, name: &str) -> Result<Option<User>>;

    /// Check a login candidate for a user this backend resolved
    async fn verify_password(&self, user: &User, candidate: &str) -> Result<bool> {
        Ok(user.validate_password(candidate))
    }

    /// Get the backend name for logging/debugging
    fn provider_name(&self) -> &'static str;
}

/// One record of the credentials document
#[derive(Debug, Deserialize)]
struct RawUserRecord {
    password: Option<RawPassword>,
    #[serde(default)]
    groups: HashSet<String>,
    #[serde(default)]
    email: Option<String>,
}

struct CachedUsers {
    loaded_at: Instant,
    users: Arc<HashMap<String, User>>,
}

/// Declarative file backend
///
/// Parses a JSON document mapping user id to `{password, groups, email}`.
/// The parsed map is cached for a short TTL so a burst of requests does not
/// re-read the document on every lookup; writes become visible within one
/// staleness window.
pub struct FileCredentials {
    path: PathBuf,
    ttl: Duration,
    cache: RwLock<Option<CachedUsers>>,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cache: RwLock::new(None),
        }
    }

    fn parse_document(&self, raw: &str) -> Result<HashMap<String, User>> {
        let records: HashMap<String, RawUserRecord> = serde_json::from_str(raw)
            .map_err(|e| RepogateError::InvalidCredentialsConfig(format!("{}", e)))?;

        let mut users = HashMap::with_capacity(records.len());
        for (id, record) in records {
            let raw_password = record.password.ok_or_else(|| {
                RepogateError::InvalidCredentialsConfig(format!(
                    "user '{}' has no password entry",
                    id
                ))
            })?;
            let password = PasswordSpec::from_raw(raw_password)?;
            users.insert(
                id.clone(),
                User {
                    id,
                    password,
                    groups: record.groups,
                    email: record.email,
                },
            );
        }
        Ok(users)
    }

    async fn users(&self) -> Result<Arc<HashMap<String, User>>> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.users.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.users.clone());
            }
        }

        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RepogateError::StorageError(format!(
                "failed to read credentials file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let users = Arc::new(self.parse_document(&raw)?);
        log::debug!(
            "Reloaded {} user(s) from {}",
            users.len(),
            self.path.display()
        );
        *cache = Some(CachedUsers {
            loaded_at: Instant::now(),
            users: users.clone(),
        });
        Ok(users)
    }
}

#[async_trait]
impl CredentialProvider for FileCredentials {
    async fn resolve(&self, name: &str) -> Result<Option<User>> {
        Ok(self.users().await?.get(name).cloned())
    }

    fn provider_name(&self) -> &'static str {
        "FILE"
    }
}

/// Single identity taken from out-of-band settings
///
/// Name/password pairing is validated at configuration load; a name without a
/// password never reaches this constructor.
pub struct EnvCredentials {
    name: String,
    password: String,
}

impl EnvCredentials {
    pub fn new(name: String, password: String) -> Self {
        Self { name, password }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn resolve(&self, name: &str) -> Result<Option<User>> {
        if name == self.name {
            Ok(Some(User::new(
                self.name.clone(),
                PasswordSpec::Plain(self.password.clone()),
            )))
        } else {
            Ok(None)
        }
    }

    fn provider_name(&self) -> &'static str {
        "ENV"
    }
}

/// Maps an opaque secret to the remote identity that owns it.
///
/// Implemented against the upstream management API by the enclosing
/// application; the auth core treats it as an opaque service.
#[async_trait]
pub trait RemoteVerifier: Send + Sync {
    /// `Ok(Some(identity))` when the remote accepts the secret,
    /// `Ok(None)` when the remote rejects it as unauthorized, and
    /// `Err` for any other remote failure.
    async fn identity_for(&self, secret: &str) -> Result<Option<String>>;
}

/// Delegated backend for identities of the shape `<provider>/<remote-name>`
pub struct DelegatedCredentials {
    provider: String,
    verifier: Arc<dyn RemoteVerifier>,
}

impl DelegatedCredentials {
    pub fn new(provider: String, verifier: Arc<dyn RemoteVerifier>) -> Self {
        Self { provider, verifier }
    }

    fn remote_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(&self.provider)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|remote| !remote.is_empty())
    }
}

#[async_trait]
impl CredentialProvider for DelegatedCredentials {
    async fn resolve(&self, name: &str) -> Result<Option<User>> {
        Ok(self
            .remote_name(name)
            .map(|_| User::delegated(name.to_string())))
    }

    async fn verify_password(&self, user: &User, candidate: &str) -> Result<bool> {
        let requested = match self.remote_name(&user.id) {
            Some(remote) => remote,
            None => return Ok(false),
        };

        // An unauthorized secret is a wrong password, not a server fault;
        // any other remote failure propagates.
        match self.verifier.identity_for(candidate).await? {
            Some(remote_identity) => Ok(remote_identity.eq_ignore_ascii_case(requested)),
            None => Ok(false),
        }
    }

    fn provider_name(&self) -> &'static str {
        "DELEGATED"
    }
}

/// Ordered backend composition: the first backend that resolves a name wins
/// and later backends are never consulted, even if the password check then
/// fails. Results are never merged across backends.
pub struct CredentialChain {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a credential backend; order of addition is consultation order
    pub fn add_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Resolve a name through the chain, first non-empty result wins
    pub async fn resolve(&self, name: &str) -> Result<Option<User>> {
        for provider in &self.providers {
            if let Some(user) = provider.resolve(name).await? {
                log::debug!("Resolved '{}' via provider: {}", name, provider.provider_name());
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Resolve a name and validate the password with the resolving backend
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<User> {
        for provider in &self.providers {
            if let Some(user) = provider.resolve(name).await? {
                if provider.verify_password(&user, password).await? {
                    log::debug!(
                        "Authenticated '{}' via provider: {}",
                        name,
                        provider.provider_name()
                    );
                    return Ok(user);
                }
                log::debug!(
                    "Password check failed for '{}' via provider: {}",
                    name,
                    provider.provider_name()
                );
                return Err(RepogateError::InvalidCredentials);
            }
        }
        log::debug!("No credential provider knows '{}'", name);
        Err(RepogateError::InvalidCredentials)
    }
}

impl Default for CredentialChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct TempDoc(PathBuf);

    impl TempDoc {
        fn write(contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!("repogate-creds-{}.json", uuid::Uuid::new_v4()));
            std::fs::write(&path, contents).unwrap();
            Self(path)
        }

        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempDoc {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[tokio::test]
    async fn test_file_backend_resolves_users() {
        let doc = TempDoc::write(
            r#"{
                "bob": {"password": "plain:pw", "groups": ["devs"]},
                "alice": {"password": {"type": "plain", "value": "other"}, "email": "alice@example.com"}
            }"#,
        );
        let backend = FileCredentials::new(doc.path(), Duration::from_secs(60));

        let bob = backend.resolve("bob").await.unwrap().unwrap();
        assert!(bob.validate_password("pw"));
        assert!(bob.groups().contains("devs"));

        let alice = backend.resolve("alice").await.unwrap().unwrap();
        assert_eq!(alice.email.as_deref(), Some("alice@example.com"));

        assert!(backend.resolve("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backend_rejects_missing_password() {
        let doc = TempDoc::write(r#"{"bob": {"groups": ["devs"]}}"#);
        let backend = FileCredentials::new(doc.path(), Duration::from_secs(60));
        assert!(matches!(
            backend.resolve("bob").await,
            Err(RepogateError::InvalidCredentialsConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_file_backend_cache_staleness_window() {
        let doc = TempDoc::write(r#"{"bob": {"password": "plain:pw"}}"#);
        let backend = FileCredentials::new(doc.path(), Duration::from_secs(300));

        assert!(backend.resolve("bob").await.unwrap().is_some());

        // Within the TTL the stale cache still answers
        std::fs::write(doc.path(), r#"{"carol": {"password": "plain:pw"}}"#).unwrap();
        assert!(backend.resolve("bob").await.unwrap().is_some());
        assert!(backend.resolve("carol").await.unwrap().is_none());

        // A zero-TTL backend sees the write immediately
        let fresh = FileCredentials::new(doc.path(), Duration::ZERO);
        assert!(fresh.resolve("carol").await.unwrap().is_some());
        assert!(fresh.resolve("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_env_backend() {
        let backend = EnvCredentials::new("admin".to_string(), "hunter2".to_string());

        let user = backend.resolve("admin").await.unwrap().unwrap();
        assert!(user.validate_password("hunter2"));
        assert!(!user.validate_password("wrong"));
        assert!(backend.resolve("other").await.unwrap().is_none());
    }

    struct FakeRemote {
        accepts: Option<(String, String)>, // (secret, identity)
        fail_hard: bool,
    }

    #[async_trait]
    impl RemoteVerifier for FakeRemote {
        async fn identity_for(&self, secret: &str) -> Result<Option<String>> {
            if self.fail_hard {
                return Err(RepogateError::ProviderError("remote down".to_string()));
            }
            Ok(self
                .accepts
                .as_ref()
                .filter(|(s, _)| s == secret)
                .map(|(_, identity)| identity.clone()))
        }
    }

    fn delegated(remote: FakeRemote) -> DelegatedCredentials {
        DelegatedCredentials::new("github".to_string(), Arc::new(remote))
    }

    #[tokio::test]
    async fn test_delegated_resolves_only_prefixed_names() {
        let backend = delegated(FakeRemote {
            accepts: None,
            fail_hard: false,
        });

        assert!(backend.resolve("github/alice").await.unwrap().is_some());
        assert!(backend.resolve("alice").await.unwrap().is_none());
        assert!(backend.resolve("gitlab/alice").await.unwrap().is_none());
        assert!(backend.resolve("github/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delegated_matches_remote_identity_case_insensitively() {
        let backend = delegated(FakeRemote {
            accepts: Some(("tok123".to_string(), "Alice".to_string())),
            fail_hard: false,
        });

        let user = backend.resolve("github/alice").await.unwrap().unwrap();
        assert!(backend.verify_password(&user, "tok123").await.unwrap());
        assert!(!backend.verify_password(&user, "wrong").await.unwrap());

        // A valid secret for a different remote identity is not a match
        let other = backend.resolve("github/mallory").await.unwrap().unwrap();
        assert!(!backend.verify_password(&other, "tok123").await.unwrap());
    }

    #[tokio::test]
    async fn test_delegated_hard_failure_propagates() {
        let backend = delegated(FakeRemote {
            accepts: None,
            fail_hard: true,
        });
        let user = backend.resolve("github/alice").await.unwrap().unwrap();
        assert!(matches!(
            backend.verify_password(&user, "tok").await,
            Err(RepogateError::ProviderError(_))
        ));
    }

    #[tokio::test]
    async fn test_chain_first_match_wins() {
        let doc = TempDoc::write(r#"{"admin": {"password": "plain:from-file"}}"#);
        let chain = CredentialChain::new()
            .add_provider(Arc::new(FileCredentials::new(
                doc.path(),
                Duration::from_secs(60),
            )))
            .add_provider(Arc::new(EnvCredentials::new(
                "admin".to_string(),
                "from-env".to_string(),
            )));

        // The file backend resolves 'admin' first; the env backend's password
        // for the same name must never be consulted.
        assert!(chain.authenticate("admin", "from-file").await.is_ok());
        assert!(matches!(
            chain.authenticate("admin", "from-env").await,
            Err(RepogateError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_chain_falls_through_unknown_names() {
        let doc = TempDoc::write(r#"{"bob": {"password": "plain:pw"}}"#);
        let chain = CredentialChain::new()
            .add_provider(Arc::new(FileCredentials::new(
                doc.path(),
                Duration::from_secs(60),
            )))
            .add_provider(Arc::new(EnvCredentials::new(
                "admin".to_string(),
                "hunter2".to_string(),
            )));

        assert!(chain.authenticate("admin", "hunter2").await.is_ok());
        assert!(matches!(
            chain.authenticate("nobody", "pw").await,
            Err(RepogateError::InvalidCredentials)
        ));
    }
}
