//! End-to-end pipeline scenarios: password login, token gate, permission gate

use std::sync::Arc;
use std::time::Duration;

use repogate::auth::credentials::{CredentialChain, FileCredentials};
use repogate::auth::pipeline::AuthPipeline;
use repogate::auth::token::TokenCodec;
use repogate::authz::policy::PermissionPolicy;
use repogate::authz::store::StaticPermissionStore;
use repogate::error::RepogateError;
use repogate::session::SessionStore;

const TEST_KEY: &[u8] = b"integration-test-signing-key-0123456789";

struct TempDoc(std::path::PathBuf);

impl TempDoc {
    fn write(contents: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("repogate-e2e-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for TempDoc {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn pipeline_with(credentials_doc: &TempDoc, grants: &str) -> AuthPipeline {
    let chain = CredentialChain::new().add_provider(Arc::new(FileCredentials::new(
        &credentials_doc.0,
        Duration::from_secs(60),
    )));
    let policy = PermissionPolicy::from_json(
        r#"[
            {"path": "/repositories.*", "method": "GET|HEAD", "permissions": ["repo-read"]},
            {"path": "/users.*", "method": "POST|PUT|DELETE", "permissions": ["users-write"]},
            {"path": "/admin.*", "method": ".*", "permissions": ["admin"]}
        ]"#,
    )
    .unwrap();
    let permissions = StaticPermissionStore::from_json(grants).unwrap();

    AuthPipeline::new(
        TokenCodec::new(TEST_KEY),
        chain,
        policy,
        Arc::new(permissions),
        SessionStore::new(Duration::from_secs(60)),
        Duration::from_secs(3600),
    )
}

#[tokio::test]
async fn test_login_token_and_permission_gates() {
    let creds = TempDoc::write(r#"{"bob": {"password": "plain:pw"}}"#);
    let pipeline = pipeline_with(&creds, r#"{"bob": ["users-write"]}"#);

    // Login with the declared plain password mints a token
    let token = pipeline.login("bob", "pw", None).await.unwrap();

    // The token establishes bob's identity
    let user = pipeline.authenticate_token(&token).unwrap();
    assert_eq!(user, "bob");

    // bob holds users-write, so a users route admits him
    pipeline.authorize(&user, "/users/carol", "POST").await.unwrap();

    // The same identity lacks admin
    assert!(matches!(
        pipeline.authorize(&user, "/admin/settings", "GET").await,
        Err(RepogateError::Forbidden)
    ));
}

#[tokio::test]
async fn test_sha256_credentials_and_repo_read() {
    // echo -n "secret" | sha256sum
    let creds = TempDoc::write(
        r#"{"alice": {"password": "sha256:2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"}}"#,
    );
    let pipeline = pipeline_with(&creds, r#"{"alice": ["repo-read"]}"#);

    assert!(matches!(
        pipeline.login("alice", "wrong", None).await,
        Err(RepogateError::InvalidCredentials)
    ));

    let token = pipeline.login("alice", "secret", None).await.unwrap();
    let user = pipeline.authenticate_token(&token).unwrap();

    pipeline
        .authorize(&user, "/repositories/x", "GET")
        .await
        .unwrap();

    // repo-read admits reads only; writes need a different permission
    assert!(matches!(
        pipeline.authorize(&user, "/users/x", "POST").await,
        Err(RepogateError::Forbidden)
    ));
}

#[tokio::test]
async fn test_permission_grant_flips_the_decision() {
    let creds = TempDoc::write(r#"{"bob": {"password": "plain:pw"}}"#);

    let without = pipeline_with(&creds, r#"{}"#);
    assert!(matches!(
        without.authorize("bob", "/repositories/x", "GET").await,
        Err(RepogateError::Forbidden)
    ));

    let with = pipeline_with(&creds, r#"{"bob": ["repo-read"]}"#);
    with.authorize("bob", "/repositories/x", "GET").await.unwrap();
}

#[tokio::test]
async fn test_unmatched_request_shape_is_unrestricted() {
    let creds = TempDoc::write(r#"{"bob": {"password": "plain:pw"}}"#);
    let pipeline = pipeline_with(&creds, r#"{}"#);

    // No rule matches /metrics: no restriction is configured
    pipeline.authorize("bob", "/metrics", "GET").await.unwrap();
}

#[tokio::test]
async fn test_session_path_establishes_identity() {
    let creds = TempDoc::write(r#"{"bob": {"password": "plain:pw"}}"#);
    let pipeline = pipeline_with(&creds, r#"{"bob": ["users-write"]}"#);

    let sid = pipeline.open_session("bob", "pw").await.unwrap();
    let user = pipeline.authenticate_session(&sid).await.unwrap();
    assert_eq!(user, "bob");

    pipeline.authorize(&user, "/users/x", "PUT").await.unwrap();
}
