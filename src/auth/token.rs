use crate::auth::clock::Clock;
use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while signing or verifying a credential.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The signing secret is empty or blank. Fatal at startup.
    #[error("signing secret is missing")]
    MissingSecret,
    /// The signature does not match the configured secret.
    #[error("invalid signature")]
    InvalidSignature,
    /// The signature is authentic but the embedded expiry has passed.
    #[error("token expired")]
    Expired,
    /// The credential could not be decoded at all.
    #[error("malformed token: {0}")]
    Malformed(String),
    /// Encoding a credential failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: i32,
    /// Unique id of this issuance.
    pub jti: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Signs and verifies HS256 credentials with a single shared secret.
///
/// Expiry is checked against the injected [`Clock`] rather than the
/// system time, so the signer agrees with the token store about "now".
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    /// Builds a signer for `secret`.
    ///
    /// Returns `TokenError::MissingSecret` if the secret is blank; callers
    /// are expected to treat that as a startup failure.
    pub fn new(secret: &str, validity: Duration, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
            clock,
        })
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Signs a credential for `subject` that expires one validity window
    /// after the clock's current time.
    pub fn issue(&self, subject: i32, token_id: Uuid) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: subject,
            jti: token_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verifies the signature of `token` and returns its claims unchanged.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared against our own clock below.
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
