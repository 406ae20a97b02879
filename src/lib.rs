//! Repogate - authentication and authorization core for a repository
//! management front end
//!
//! Decides, per incoming request, who the caller is (bearer token or
//! dashboard session) and whether that identity may perform the requested
//! operation (declarative permission rules). Everything around it - routing,
//! templating, storage - consumes the decisions through the handlers layer.

pub mod auth;
pub mod authz;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod session;

// Re-export main components
pub use config::*;
pub use constants::*;
