//! Per-request auth orchestration
//!
//! Gate 1 establishes identity from a bearer token or a dashboard session;
//! gate 2 checks the identity against the permission policy. Authentication
//! failures are never retried here and no lockout or throttling is applied;
//! clients simply re-authenticate.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::auth::credentials::CredentialChain;
use crate::auth::token::TokenCodec;
use crate::authz::policy::PermissionPolicy;
use crate::authz::store::PermissionStore;
use crate::constants::{MAX_TOKEN_TTL_SECS, MIN_TOKEN_TTL_SECS};
use crate::error::{RepogateError, Result};
use crate::session::SessionStore;

pub struct AuthPipeline {
    codec: TokenCodec,
    credentials: CredentialChain,
    policy: PermissionPolicy,
    permissions: Arc<dyn PermissionStore>,
    sessions: SessionStore,
    default_token_ttl: Duration,
}

impl AuthPipeline {
    pub fn new(
        codec: TokenCodec,
        credentials: CredentialChain,
        policy: PermissionPolicy,
        permissions: Arc<dyn PermissionStore>,
        sessions: SessionStore,
        default_token_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            credentials,
            policy,
            permissions,
            sessions,
            default_token_ttl,
        }
    }

    /// Token lifetime is caller-chosen within fixed bounds
    fn clamp_ttl(&self, requested: Option<Duration>) -> Duration {
        let ttl = requested.unwrap_or(self.default_token_ttl);
        ttl.clamp(
            Duration::from_secs(MIN_TOKEN_TTL_SECS),
            Duration::from_secs(MAX_TOKEN_TTL_SECS),
        )
    }

    /// Password login: validate through the credential chain, mint a token
    pub async fn login(
        &self,
        name: &str,
        password: &str,
        ttl: Option<Duration>,
    ) -> Result<String> {
        let user = self.credentials.authenticate(name, password).await?;
        let expires_at = SystemTime::now() + self.clamp_ttl(ttl);
        self.codec.issue(&user.id, expires_at)
    }

    /// Password login for the dashboard: bind the identity to a session
    pub async fn open_session(&self, name: &str, password: &str) -> Result<String> {
        let user = self.credentials.authenticate(name, password).await?;
        Ok(self.sessions.open(&user.id).await)
    }

    pub async fn close_session(&self, session_id: &str) {
        self.sessions.revoke(session_id).await;
    }

    /// Gate 1, bearer path. The signature is checked before any embedded
    /// field is trusted; expiry is reported separately so a thin client can
    /// tell "invalid token" from "token expired".
    pub fn authenticate_token(&self, bearer: &str) -> Result<String> {
        if !self.codec.verify(bearer) {
            // Shape the reason without trusting the content
            return match self.codec.parse(bearer) {
                Ok(_) => Err(RepogateError::InvalidSignature),
                Err(_) => Err(RepogateError::MalformedToken),
            };
        }

        let token = self.codec.parse(bearer)?;
        if token.is_expired(SystemTime::now()) {
            return Err(RepogateError::TokenExpired);
        }
        Ok(token.user().to_string())
    }

    /// Gate 1, session-cookie path
    pub async fn authenticate_session(&self, session_id: &str) -> Result<String> {
        self.sessions
            .user_for(session_id)
            .await
            .ok_or(RepogateError::Unauthorized)
    }

    /// Gate 2: the caller passes if it holds at least one of the permissions
    /// required for this request shape. An empty required set means no
    /// restriction is configured and the (authenticated) caller is admitted.
    pub async fn authorize(&self, user_id: &str, path: &str, method: &str) -> Result<()> {
        let required = self.policy.required_permissions(path, method);
        if required.is_empty() {
            return Ok(());
        }

        for permission in &required {
            if self.permissions.allowed(user_id, permission).await? {
                return Ok(());
            }
        }
        log::debug!("User '{}' denied for {} {}", user_id, method, path);
        Err(RepogateError::Forbidden)
    }
}
