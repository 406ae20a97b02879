//! Per-request auth filter and rejection rendering
//!
//! `protect` runs both gates in front of a route: identity from the
//! Authorization header or the session cookie, then the permission check for
//! the request's method and full path. Failures short-circuit with a JSON
//! `{"error": ...}` body; reason strings never echo token or key material and
//! a 403 never names the missing permission.

use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use crate::auth::pipeline::AuthPipeline;
use crate::constants::SESSION_COOKIE;
use crate::error::{RepogateError, Result as AuthResult};
use crate::handlers::auth::extract_bearer_token;

/// Rejection wrapper carrying the typed auth error to the recover handler
#[derive(Debug)]
pub struct AuthReject(pub RepogateError);

impl warp::reject::Reject for AuthReject {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Injects the shared pipeline into a filter chain
pub fn with_pipeline(
    pipeline: Arc<AuthPipeline>,
) -> impl Filter<Extract = (Arc<AuthPipeline>,), Error = Infallible> + Clone {
    warp::any().map(move || pipeline.clone())
}

/// Both gates in front of a route; extracts the authenticated user id
pub fn protect(
    pipeline: Arc<AuthPipeline>,
) -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional(SESSION_COOKIE))
        .and(warp::method())
        .and(warp::path::full())
        .and(with_pipeline(pipeline))
        .and_then(run_gates)
}

async fn run_gates(
    auth_header: Option<String>,
    session_id: Option<String>,
    method: Method,
    path: FullPath,
    pipeline: Arc<AuthPipeline>,
) -> Result<String, Rejection> {
    let user_id = establish_identity(auth_header, session_id, &pipeline)
        .await
        .map_err(|e| warp::reject::custom(AuthReject(e)))?;

    pipeline
        .authorize(&user_id, path.as_str(), method.as_str())
        .await
        .map_err(|e| warp::reject::custom(AuthReject(e)))?;

    Ok(user_id)
}

/// Gate 1: bearer header takes precedence over the session cookie
async fn establish_identity(
    auth_header: Option<String>,
    session_id: Option<String>,
    pipeline: &AuthPipeline,
) -> AuthResult<String> {
    if let Some(header) = auth_header {
        let bearer = extract_bearer_token(&header).ok_or(RepogateError::Unauthorized)?;
        return pipeline.authenticate_token(&bearer);
    }
    if let Some(sid) = session_id {
        return pipeline.authenticate_session(&sid).await;
    }
    Err(RepogateError::Unauthorized)
}

fn status_for(error: &RepogateError) -> StatusCode {
    match error {
        RepogateError::MalformedToken
        | RepogateError::InvalidSignature
        | RepogateError::TokenExpired
        | RepogateError::InvalidCredentials
        | RepogateError::Unauthorized => StatusCode::UNAUTHORIZED,
        RepogateError::Forbidden => StatusCode::FORBIDDEN,
        // Configuration and provider defects are deployment problems
        RepogateError::UnsupportedPasswordScheme(_)
        | RepogateError::InvalidCredentialsConfig(_)
        | RepogateError::ProviderError(_)
        | RepogateError::ConfigError(_)
        | RepogateError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Renders rejections as `{"error": reason}` with the matching status
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(AuthReject(auth_err)) = err.find::<AuthReject>() {
        let status = status_for(auth_err);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Log the defect, keep the response opaque
            log::error!("Auth core failure: {}", auth_err);
            (status, "internal server error".to_string())
        } else {
            (status, auth_err.to_string())
        }
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid request body".to_string())
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
