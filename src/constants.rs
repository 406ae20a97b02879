// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;

// Token binary layout sizes (hex-encoded on the wire)
pub const TOKEN_EXPIRATION_BYTES: usize = 4;
pub const TOKEN_NONCE_BYTES: usize = 4;
pub const TOKEN_SIGNATURE_BYTES: usize = 20;
/// The user id length field is a single byte, so ids are capped at 255 bytes.
pub const TOKEN_MAX_USER_BYTES: usize = 255;

// Token lifetime bounds; callers pick within this range
pub const MIN_TOKEN_TTL_SECS: u64 = 20 * 60;
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

// Credential file cache staleness window
pub const DEFAULT_CREDENTIAL_CACHE_TTL_SECS: u64 = 2;

// Dashboard session lifetime
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

// Cookie carrying the dashboard session id
pub const SESSION_COOKIE: &str = "sid";
