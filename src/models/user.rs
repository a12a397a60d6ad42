use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access level of a user account.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular account created through signup.
    WebUser,
    /// May manage other accounts.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::WebUser => "web_user",
            Role::Admin => "admin",
        }
    }

    /// Parses the stored column value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "web_user" => Some(Role::WebUser),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// An authenticated principal as resolved from the user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Never sent to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
