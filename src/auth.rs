//! Auth collaborator - password hashing and JWT session tokens
//!
//! Passwords are stored as base64(salt || digest) where the digest is an
//! iterated salted SHA-256 (16-byte random salt, 100 000 rounds). Tokens
//! are HS256 JWTs carrying the user id and email, valid for 7 days.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SALT_LEN: usize = 16;
const HASH_ROUNDS: u32 = 100_000;
/// Token lifetime: 7 days
const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token encoding failed")]
    Encoding,
}

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub exp: i64,
}

/// Signing configuration shared by issue and verify
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a 7-day session token for a user
    pub fn issue(&self, user_id: i64, email: &str) -> Result<String, AuthError> {
        let claims = Claims {
            email: email.to_string(),
            user_id,
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthError::Encoding)
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

fn derive(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();
    for _ in 1..HASH_ROUNDS {
        digest = Sha256::digest(&digest);
    }
    digest.into()
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let digest = derive(password, &salt);

    let mut combined = Vec::with_capacity(SALT_LEN + digest.len());
    combined.extend_from_slice(&salt);
    combined.extend_from_slice(&digest);
    BASE64.encode(combined)
}

/// Check a password against a stored hash
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Ok(combined) = BASE64.decode(stored) else {
        return false;
    };
    if combined.len() != SALT_LEN + 32 {
        return false;
    }
    let (salt, expected) = combined.split_at(SALT_LEN);
    derive(password, salt) == expected
}
