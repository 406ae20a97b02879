//! Compact binary bearer tokens
//!
//! Wire format (hex-encoded): `user_len (1) | user (utf-8) | expiration (4, BE
//! epoch seconds) | nonce (4, random) | signature (20, HMAC-SHA1 over the
//! preceding bytes)`. Tokens are stateless; nothing is kept server-side and
//! the only lifecycle is mint and check.

use rand::RngCore;
use ring::hmac;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{
    TOKEN_EXPIRATION_BYTES, TOKEN_MAX_USER_BYTES, TOKEN_NONCE_BYTES, TOKEN_SIGNATURE_BYTES,
};
use crate::error::{RepogateError, Result};

const TOKEN_TRAILER_BYTES: usize =
    TOKEN_EXPIRATION_BYTES + TOKEN_NONCE_BYTES + TOKEN_SIGNATURE_BYTES;

/// Seconds since the Unix epoch, truncated to the token's 4-byte field.
pub fn epoch_secs(at: SystemTime) -> u32 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// A decoded token. Produced by [`TokenCodec::parse`]; carries no proof of
/// integrity until the raw string has passed [`TokenCodec::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    user: String,
    expiration: u32,
}

impl Token {
    /// User id embedded in the token
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Expiration instant as epoch seconds
    pub fn expires_at(&self) -> u32 {
        self.expiration
    }

    /// A token is live through its expiration second and stale after it
    pub fn is_expired(&self, now: SystemTime) -> bool {
        epoch_secs(now) > self.expiration
    }
}

/// Signs and checks bearer tokens with a server-held HMAC key
pub struct TokenCodec {
    key: hmac::Key,
}

impl TokenCodec {
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key),
        }
    }

    /// Mints a signed token for `user_id` expiring at `expires_at`.
    ///
    /// The nonce makes repeated calls with identical inputs produce distinct
    /// tokens. Fails if the UTF-8 user id does not fit the one-byte length
    /// field.
    pub fn issue(&self, user_id: &str, expires_at: SystemTime) -> Result<String> {
        let user_bytes = user_id.as_bytes();
        if user_bytes.len() > TOKEN_MAX_USER_BYTES {
            return Err(RepogateError::InvalidCredentialsConfig(format!(
                "user id exceeds {} bytes and cannot be embedded in a token",
                TOKEN_MAX_USER_BYTES
            )));
        }

        let mut nonce = [0u8; TOKEN_NONCE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let mut payload = Vec::with_capacity(1 + user_bytes.len() + TOKEN_TRAILER_BYTES);
        payload.push(user_bytes.len() as u8);
        payload.extend_from_slice(user_bytes);
        payload.extend_from_slice(&epoch_secs(expires_at).to_be_bytes());
        payload.extend_from_slice(&nonce);

        let signature = hmac::sign(&self.key, &payload);
        payload.extend_from_slice(signature.as_ref());

        Ok(hex::encode(payload))
    }

    /// Checks the signature over the token payload. Fails closed on bad hex,
    /// input too short to carry a signature, or an HMAC mismatch.
    ///
    /// Expiration is deliberately not checked here; callers layer
    /// [`Token::is_expired`] on top so the two failure modes stay distinct.
    pub fn verify(&self, token_hex: &str) -> bool {
        let bytes = match hex::decode(token_hex) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        if bytes.len() <= TOKEN_SIGNATURE_BYTES {
            return false;
        }

        let (payload, signature) = bytes.split_at(bytes.len() - TOKEN_SIGNATURE_BYTES);
        // ring compares tags in constant time
        hmac::verify(&self.key, payload, signature).is_ok()
    }

    /// Decodes the binary layout without checking the signature.
    pub fn parse(&self, token_hex: &str) -> Result<Token> {
        let bytes = hex::decode(token_hex).map_err(|_| RepogateError::MalformedToken)?;
        if bytes.is_empty() {
            return Err(RepogateError::MalformedToken);
        }

        let user_len = bytes[0] as usize;
        if bytes.len() != 1 + user_len + TOKEN_TRAILER_BYTES {
            return Err(RepogateError::MalformedToken);
        }

        let user = std::str::from_utf8(&bytes[1..1 + user_len])
            .map_err(|_| RepogateError::MalformedToken)?
            .to_string();

        let exp_start = 1 + user_len;
        let mut exp_bytes = [0u8; TOKEN_EXPIRATION_BYTES];
        exp_bytes.copy_from_slice(&bytes[exp_start..exp_start + TOKEN_EXPIRATION_BYTES]);

        Ok(Token {
            user,
            expiration: u32::from_be_bytes(exp_bytes),
        })
    }
}
