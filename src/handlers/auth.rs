//! Login, session, and logout handlers

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::auth::pipeline::AuthPipeline;
use crate::constants::SESSION_COOKIE;
use crate::handlers::filters::AuthReject;

/// Body of `POST /auth/login` and `POST /auth/session`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
    /// Token lifetime in seconds; clamped to the server's bounds
    pub ttl_secs: Option<u64>,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct WhoamiResponse {
    pub user: String,
}

/// Password login minting a bearer token
pub async fn handle_login(
    request: LoginRequest,
    pipeline: Arc<AuthPipeline>,
) -> Result<impl Reply, Rejection> {
    let ttl = request.ttl_secs.map(Duration::from_secs);
    match pipeline.login(&request.name, &request.password, ttl).await {
        Ok(token) => {
            log::info!("Issued token for '{}'", request.name);
            Ok(warp::reply::json(&TokenResponse { token }))
        }
        Err(e) => {
            log::info!("Login rejected for '{}'", request.name);
            Err(warp::reject::custom(AuthReject(e)))
        }
    }
}

/// Password login opening a dashboard session; the session id travels in a
/// cookie rather than a response body
pub async fn handle_session_login(
    request: LoginRequest,
    pipeline: Arc<AuthPipeline>,
) -> Result<impl Reply, Rejection> {
    match pipeline.open_session(&request.name, &request.password).await {
        Ok(session_id) => {
            log::info!("Opened session for '{}'", request.name);
            let reply = warp::reply::json(&StatusResponse { status: "ok" });
            Ok(warp::reply::with_header(
                reply,
                "set-cookie",
                format!("{}={}; HttpOnly; Path=/", SESSION_COOKIE, session_id),
            ))
        }
        Err(e) => {
            log::info!("Session login rejected for '{}'", request.name);
            Err(warp::reject::custom(AuthReject(e)))
        }
    }
}

/// Drop the presented session and clear the cookie
pub async fn handle_logout(
    session_id: Option<String>,
    pipeline: Arc<AuthPipeline>,
) -> Result<impl Reply, Rejection> {
    if let Some(ref sid) = session_id {
        pipeline.close_session(sid).await;
    }
    let reply = warp::reply::json(&StatusResponse { status: "ok" });
    Ok(warp::reply::with_header(
        reply,
        "set-cookie",
        format!("{}=deleted; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE),
    ))
}

/// Echo the identity established by the auth filter
pub async fn handle_whoami(user_id: String) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::with_status(
        warp::reply::json(&WhoamiResponse { user: user_id }),
        StatusCode::OK,
    ))
}

/// Extracts the bearer credential from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token("Bearer abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }
}
