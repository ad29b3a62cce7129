//! Stateless bearer credentials and password hashing.
//!
//! A [SessionToken] is handed out at login and carries the authenticated user's id and the issue
//! time, HMAC-signed with the application secret. The server keeps no session state; the token's
//! signature and age are verified on every request and the user's role is freshly resolved from
//! the data_store, so a role change takes effect on the next request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::rand::SecureRandom;
use ring::{hmac, pbkdf2, rand};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
    user_id: Uuid,
    issued_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    user_id: Uuid,
    issued_at: i64,
}

impl SessionToken {
    /// Create a fresh token for the given user, issued now.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            issued_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Serialize and sign the token with the application secret.
    ///
    /// The result is `base64(payload) "." base64(hmac_sha256(payload))`.
    pub fn as_string(&self, secret: &str) -> String {
        let payload = serde_json::to_vec(&TokenPayload {
            user_id: self.user_id,
            issued_at: self.issued_at.timestamp(),
        })
        .expect("Session token payload should always be serializable");
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, &payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }

    /// Parse and verify a token string: signature must match the secret and the token must not be
    /// older than `max_age`.
    pub fn from_string(
        token: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (payload_part, signature_part) =
            token.split_once('.').ok_or(SessionError::MalformedToken)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| SessionError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|_| SessionError::MalformedToken)?;
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        hmac::verify(&key, &payload, &signature).map_err(|_| SessionError::InvalidSignature)?;
        let payload: TokenPayload =
            serde_json::from_slice(&payload).map_err(|_| SessionError::MalformedToken)?;
        let issued_at = DateTime::from_timestamp(payload.issued_at, 0)
            .ok_or(SessionError::MalformedToken)?;
        let age = Utc::now().signed_duration_since(issued_at);
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        if age.num_seconds() < 0 || age > max_age {
            return Err(SessionError::TokenExpired);
        }
        Ok(Self {
            user_id: payload.user_id,
            issued_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The token string is not of the expected two-part base64 form or carries garbage data.
    MalformedToken,
    /// The token's signature does not match the application secret.
    InvalidSignature,
    /// The token is valid but older than the allowed maximum age.
    TokenExpired,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::MalformedToken => f.write_str("Session token is malformed"),
            SessionError::InvalidSignature => f.write_str("Session token signature is invalid"),
            SessionError::TokenExpired => f.write_str("Session token has expired"),
        }
    }
}

impl std::error::Error for SessionError {}

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

#[derive(Debug)]
pub struct PasswordHashError;

impl Display for PasswordHashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Could not generate password hash")
    }
}

impl std::error::Error for PasswordHashError {}

fn pbkdf2_iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2 iteration count should be non-zero")
}

/// Hash a password for storage, using PBKDF2-HMAC-SHA256 with a random salt.
///
/// The result has the form `{iterations}${base64(salt)}${base64(hash)}`.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt = [0u8; SALT_LEN];
    rand::SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| PasswordHashError)?;
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        pbkdf2_iterations(),
        &salt,
        password.as_bytes(),
        &mut hash,
    );
    Ok(format!(
        "{}${}${}",
        PBKDF2_ITERATIONS,
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    ))
}

/// Check a password attempt against a stored hash string. Unparseable hash strings count as a
/// failed verification.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    let (Some(iterations), Some(salt), Some(hash)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Some(iterations) = NonZeroU32::new(iterations) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(hash)) else {
        return false;
    };
    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}
