//! Principal lookup used by login and token validation.

use crate::auth::store::StoreError;
use crate::models::{Role, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use std::sync::Arc;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
}

#[derive(Default)]
struct MemoryUsers {
    next_id: i32,
    users: BTreeMap<i32, User>,
}

/// In-memory [`UserDirectory`]. Clones share the same users.
#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    inner: Arc<RwLock<MemoryUsers>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user and returns it with its assigned id.
    pub fn add(&self, username: &str, email: &str, password_hash: &str, role: Role) -> User {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        user
    }

    pub fn remove(&self, id: i32) -> Option<User> {
        self.inner.write().users.remove(&id)
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Backend(format!("unknown role '{}'", row.role)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Reads principals from the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, role, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, role, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_memory_directory_lookup_and_remove() {
        let directory = MemoryUserDirectory::new();
        let alice = directory.add("alice", "alice@example.com", "hash", Role::WebUser);
        let bob = directory.add("bob", "bob@example.com", "hash", Role::Admin);
        assert_ne!(alice.id, bob.id);

        let found = directory.find_by_email("bob@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(bob.id));
        assert_eq!(directory.find_by_id(alice.id).await.unwrap(), Some(alice.clone()));

        directory.remove(alice.id);
        assert_eq!(directory.find_by_id(alice.id).await.unwrap(), None);
        assert_eq!(directory.find_by_email("alice@example.com").await.unwrap(), None);
    }
}
