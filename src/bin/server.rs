use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use repogate::auth::credentials::{CredentialChain, EnvCredentials, FileCredentials};
use repogate::auth::pipeline::AuthPipeline;
use repogate::auth::token::TokenCodec;
use repogate::authz::policy::PermissionPolicy;
use repogate::authz::store::StaticPermissionStore;
use repogate::config::AuthConfig;
use repogate::error::Result;
use repogate::handlers;
use repogate::session::SessionStore;

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    // Load config from the environment
    let config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration: host={}, port={}", config.host, config.port);

    let pipeline = match build_pipeline(&config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("Failed to build auth pipeline: {}", e);
            std::process::exit(1);
        }
    };

    // Create health check route
    let health_route = warp::path("health").map(|| "OK");

    // Combine routes
    let routes = handlers::routes(pipeline)
        .or(health_route)
        .recover(handlers::handle_rejection);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Starting Repogate server on {}", addr);

    warp::serve(routes).run(addr).await;
}

/// Wire the pipeline from configuration. Backend order is fixed here: the
/// env identity is consulted first, then the credentials document. A
/// delegated backend needs a RemoteVerifier from the enclosing application
/// and is added by whoever embeds this crate.
fn build_pipeline(config: &AuthConfig) -> Result<AuthPipeline> {
    let codec = TokenCodec::new(config.signing_key.as_bytes());

    let mut chain = CredentialChain::new();
    if let Some((name, password)) = &config.env_user {
        info!("Credential backend: env identity '{}'", name);
        chain = chain.add_provider(Arc::new(EnvCredentials::new(
            name.clone(),
            password.clone(),
        )));
    }
    if let Some(path) = &config.credentials_file {
        info!("Credential backend: file {}", path);
        chain = chain.add_provider(Arc::new(FileCredentials::new(
            path,
            config.credential_cache_ttl,
        )));
    }

    let policy = match &config.permission_rules_file {
        Some(path) => {
            let policy = PermissionPolicy::load(path)?;
            info!("Loaded {} permission rule(s) from {}", policy.rule_count(), path);
            policy
        }
        None => {
            warn!("No permission rules configured; all authenticated requests are admitted");
            PermissionPolicy::empty()
        }
    };

    let permissions = match &config.user_permissions_file {
        Some(path) => StaticPermissionStore::load(path)?,
        None => StaticPermissionStore::empty(),
    };

    Ok(AuthPipeline::new(
        codec,
        chain,
        policy,
        Arc::new(permissions),
        SessionStore::new(config.session_ttl),
        config.token_ttl,
    ))
}
