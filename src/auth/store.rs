//! Server-side token records.
//!
//! A [`TokenRecord`] is the store's authoritative notion of whether a
//! credential is still live. It is keyed by the exact credential string and
//! carries its own `expires_at`, tracked separately from the `exp` claim
//! inside the signed credential.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A record for this credential already exists.
    #[error("duplicate credential")]
    DuplicateCredential,
    #[error("token store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                StoreError::DuplicateCredential
            }
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

/// A persisted liveness record for one issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TokenRecord {
    pub id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// True once `expires_at` is strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Storage for token records.
///
/// Every operation is atomic on its own; nothing spans operations.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persists a new record. Fails with `DuplicateCredential` if the
    /// credential is already present.
    async fn insert(
        &self,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError>;

    async fn find_by_credential(&self, token: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// Removes the record with `id`. Returns whether a record was removed;
    /// deleting an absent record is not an error.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    by_token: HashMap<String, TokenRecord>,
    by_id: HashMap<Uuid, String>,
}

/// In-memory [`TokenStore`] for tests and development.
///
/// Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(
        &self,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError> {
        let mut inner = self.inner.write();
        if inner.by_token.contains_key(token) {
            return Err(StoreError::DuplicateCredential);
        }

        let record = TokenRecord {
            id: Uuid::new_v4(),
            token: token.to_string(),
            created_at,
            expires_at,
        };
        inner.by_id.insert(record.id, record.token.clone());
        inner.by_token.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_credential(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.inner.read().by_token.get(token).cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        match inner.by_id.remove(&id) {
            Some(token) => Ok(inner.by_token.remove(&token).is_some()),
            None => Ok(false),
        }
    }
}

/// Postgres-backed [`TokenStore`] over the `auth_tokens` table.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(
        &self,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "INSERT INTO auth_tokens (id, token, created_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, token, created_at, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_credential(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT id, token, created_at, expires_at FROM auth_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[actix_rt::test]
    async fn test_insert_and_find() {
        let store = MemoryTokenStore::new();
        let now = Utc::now();

        let record = store
            .insert("token-a", now, now + Duration::hours(1))
            .await
            .unwrap();

        let found = store.find_by_credential("token-a").await.unwrap();
        assert_eq!(found, Some(record));
        assert_eq!(store.find_by_credential("token-b").await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = MemoryTokenStore::new();
        let now = Utc::now();

        store.insert("token-a", now, now).await.unwrap();
        let second = store.insert("token-a", now, now).await;

        assert_eq!(second, Err(StoreError::DuplicateCredential));
        assert_eq!(store.len(), 1);
    }

    #[actix_rt::test]
    async fn test_delete_by_id_is_idempotent() {
        let store = MemoryTokenStore::new();
        let now = Utc::now();
        let record = store.insert("token-a", now, now).await.unwrap();

        assert!(store.delete_by_id(record.id).await.unwrap());
        assert!(!store.delete_by_id(record.id).await.unwrap());
        assert!(store.is_empty());
        assert_eq!(store.find_by_credential("token-a").await.unwrap(), None);
    }

    #[test]
    fn test_record_expiry_is_strict() {
        let now = Utc::now();
        let record = TokenRecord {
            id: Uuid::new_v4(),
            token: "t".into(),
            created_at: now,
            expires_at: now,
        };

        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + Duration::milliseconds(1)));
    }

    // Requires a Postgres instance with migrations/ applied.
    #[ignore]
    #[actix_rt::test]
    async fn test_pg_store_roundtrip() {
        dotenv::dotenv().ok();
        let pool = PgPool::connect(&std::env::var("DATABASE_URL").expect("DATABASE_URL not set"))
            .await
            .unwrap();
        let store = PgTokenStore::new(pool);
        let now = Utc::now();
        let token = format!("pg-test-{}", Uuid::new_v4());

        let record = store
            .insert(&token, now, now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(
            store.insert(&token, now, now).await,
            Err(StoreError::DuplicateCredential)
        );
        assert!(store.find_by_credential(&token).await.unwrap().is_some());
        assert!(store.delete_by_id(record.id).await.unwrap());
        assert!(store.find_by_credential(&token).await.unwrap().is_none());
    }
}
