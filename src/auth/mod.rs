pub mod clock;
pub mod directory;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;
pub mod token;

use serde::Deserialize;
use validator::Validate;

// Re-export necessary items
pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{MemoryUserDirectory, PgUserDirectory, UserDirectory};
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{BcryptHasher, PasswordHasher};
pub use session::{strip_scheme, IssuedSession, SessionError, SessionManager, TOKEN_SCHEME};
pub use store::{MemoryTokenStore, PgTokenStore, StoreError, TokenRecord, TokenStore};
pub use token::{Claims, TokenError, TokenSigner};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password. Must not be empty.
    #[validate(length(min = 1))]
    pub password: String,
}
