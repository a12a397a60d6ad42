//! Session issuance and validation.
//!
//! A session is live only while both of these hold:
//!
//! - the credential's signature verifies and its `exp` claim has not passed;
//! - the store holds a record for the exact credential string whose
//!   `expires_at` has not passed.
//!
//! Records found expired are deleted on the spot (lazy purge); there is no
//! background sweep.

use crate::auth::clock::Clock;
use crate::auth::directory::UserDirectory;
use crate::auth::password::{HashError, PasswordHasher};
use crate::auth::store::{StoreError, TokenRecord, TokenStore};
use crate::auth::token::{TokenError, TokenSigner};
use crate::models::User;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Scheme label that prefixes every credential handed to clients.
pub const TOKEN_SCHEME: &str = "Bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Password did not match at login.
    #[error("Invalid email and password combination")]
    InvalidCredentials,
    /// Unknown email at login, or the token's user no longer exists.
    #[error("{0}")]
    NotFound(String),
    /// Bad scheme, bad signature, expired signature, or absent/expired record.
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl From<TokenError> for SessionError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::MissingSecret | TokenError::Encoding(_) => {
                SessionError::Internal(error.to_string())
            }
            TokenError::InvalidSignature | TokenError::Expired | TokenError::Malformed(_) => {
                SessionError::InvalidToken(error.to_string())
            }
        }
    }
}

impl From<HashError> for SessionError {
    fn from(error: HashError) -> Self {
        SessionError::Internal(error.to_string())
    }
}

/// What a successful login hands back to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedSession {
    /// `"<SCHEME> <credential>"`, ready for the `Authorization` header.
    pub token: String,
    /// Store-side expiry of the session record.
    #[serde(rename = "expiredAt")]
    pub expired_at: DateTime<Utc>,
}

/// Splits `"<SCHEME> <credential>"` and returns the bare credential.
pub fn strip_scheme(presented: &str) -> Result<&str, SessionError> {
    let (scheme, token) = presented
        .split_once(' ')
        .ok_or_else(|| SessionError::InvalidToken("missing token scheme".into()))?;

    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) {
        return Err(SessionError::InvalidToken(format!(
            "unsupported token scheme '{}'",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(SessionError::InvalidToken("empty token".into()));
    }
    Ok(token)
}

/// Issues and validates sessions.
///
/// Holds no mutable state of its own; everything lives in the
/// [`TokenStore`]. Cheap to clone and safe to share across workers.
#[derive(Clone)]
pub struct SessionManager {
    signer: TokenSigner,
    store: Arc<dyn TokenStore>,
    users: Arc<dyn UserDirectory>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    record_ttl: Duration,
}

impl SessionManager {
    /// The store-side record lifetime defaults to the signer's validity
    /// window; the two are still computed and checked separately.
    pub fn new(
        signer: TokenSigner,
        store: Arc<dyn TokenStore>,
        users: Arc<dyn UserDirectory>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let record_ttl = signer.validity();
        Self {
            signer,
            store,
            users,
            hasher,
            clock,
            record_ttl,
        }
    }

    /// Overrides how long store records live.
    pub fn with_record_ttl(mut self, record_ttl: Duration) -> Self {
        self.record_ttl = record_ttl;
        self
    }

    /// Logs a user in and persists a fresh session record.
    pub async fn issue_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IssuedSession, SessionError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| SessionError::NotFound("User not found".into()))?;

        if !self.hasher.verify_hash(password, &user.password_hash)? {
            warn!("Rejected login for user {}: password mismatch", user.id);
            return Err(SessionError::InvalidCredentials);
        }

        let now = self.clock.now();
        let token = self.signer.issue(user.id, Uuid::new_v4())?;
        let record = self
            .store
            .insert(&token, now, now + self.record_ttl)
            .await
            .map_err(|e| {
                error!("Failed to persist session for user {}: {}", user.id, e);
                e
            })?;

        info!("Issued session {} for user {}", record.id, user.id);
        Ok(IssuedSession {
            token: format!("{} {}", TOKEN_SCHEME, token),
            expired_at: record.expires_at,
        })
    }

    /// Validates a `"<SCHEME> <credential>"` value, as found in an
    /// `Authorization` header, and resolves its user.
    pub async fn validate_session(&self, presented: &str) -> Result<User, SessionError> {
        let token = strip_scheme(presented).map_err(|e| {
            warn!("Rejected token: {}", e);
            e
        })?;
        self.validate_token(token).await
    }

    /// Validates a bare credential (scheme already stripped).
    pub async fn validate_token(&self, token: &str) -> Result<User, SessionError> {
        let now = self.clock.now();

        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                // Authentic but past its exp: purge the record if it is due too.
                if let Some(record) = self.store.find_by_credential(token).await? {
                    self.purge_if_expired(&record, now).await?;
                }
                warn!("Rejected token: signature expired");
                return Err(TokenError::Expired.into());
            }
            Err(e) => {
                warn!("Rejected token: {}", e);
                return Err(e.into());
            }
        };

        let record = match self.store.find_by_credential(token).await? {
            Some(record) => record,
            None => {
                warn!("Rejected token for user {}: no session record", claims.sub);
                return Err(SessionError::InvalidToken("unknown token".into()));
            }
        };

        if self.purge_if_expired(&record, now).await? {
            warn!("Rejected token for user {}: session expired", claims.sub);
            return Err(SessionError::InvalidToken("session expired".into()));
        }

        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| SessionError::NotFound("User not found".into()))
    }

    /// Deletes `record` if it expired before `now`. Returns whether it was due.
    async fn purge_if_expired(
        &self,
        record: &TokenRecord,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        if !record.is_expired_at(now) {
            return Ok(false);
        }

        // A concurrent validation may have purged it already.
        let removed = self.store.delete_by_id(record.id).await?;
        debug!("Purged expired session {} (removed: {})", record.id, removed);
        Ok(true)
    }
}
