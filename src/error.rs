use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum RepogateError {
    // Token errors
    MalformedToken,
    InvalidSignature,
    TokenExpired,

    // Credential errors
    InvalidCredentials,
    UnsupportedPasswordScheme(String),
    InvalidCredentialsConfig(String),

    // Authorization errors
    Unauthorized,
    Forbidden,

    // Delegated provider errors
    ProviderError(String),

    // Configuration errors
    ConfigError(String),

    // Document loading errors
    StorageError(String),
}

impl fmt::Display for RepogateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "invalid token"),
            Self::InvalidSignature => write!(f, "invalid token"),
            Self::TokenExpired => write!(f, "token expired"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::UnsupportedPasswordScheme(scheme) => {
                write!(f, "unsupported password scheme: {}", scheme)
            }
            Self::InvalidCredentialsConfig(msg) => {
                write!(f, "invalid credentials configuration: {}", msg)
            }
            Self::Unauthorized => write!(f, "authentication required"),
            Self::Forbidden => write!(f, "request is not allowed"),
            Self::ProviderError(msg) => write!(f, "credential provider error: {}", msg),
            Self::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            Self::StorageError(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl Error for RepogateError {}

// Generic result type for Repogate
pub type Result<T> = std::result::Result<T, RepogateError>;
