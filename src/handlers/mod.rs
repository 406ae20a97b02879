//! Request handlers and filters for the auth HTTP surface

pub mod auth;
pub mod filters;

use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

use crate::auth::pipeline::AuthPipeline;
use crate::constants::SESSION_COOKIE;
use crate::handlers::filters::{protect, with_pipeline};

// Re-export the rejection renderer for server wiring
pub use filters::handle_rejection;

/// The auth routes exposed to the surrounding request-dispatch layer
pub fn routes(
    pipeline: Arc<AuthPipeline>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pipeline(pipeline.clone()))
        .and_then(auth::handle_login);

    let session = warp::path!("auth" / "session")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pipeline(pipeline.clone()))
        .and_then(auth::handle_session_login);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(warp::cookie::optional(SESSION_COOKIE))
        .and(with_pipeline(pipeline.clone()))
        .and_then(auth::handle_logout);

    let whoami = warp::path!("auth" / "whoami")
        .and(warp::get())
        .and(protect(pipeline))
        .and_then(auth::handle_whoami);

    login.or(session).or(logout).or(whoami)
}
