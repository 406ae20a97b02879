//! Authentication: tokens, credential resolution, per-request orchestration

pub mod credentials;
pub mod pipeline;
pub mod token;
pub mod user;

// Re-export main components
pub use credentials::{
    CredentialChain, CredentialProvider, DelegatedCredentials, EnvCredentials, FileCredentials,
    RemoteVerifier,
};
pub use pipeline::AuthPipeline;
pub use token::{Token, TokenCodec};
pub use user::{PasswordSpec, User};
