use bcrypt::{hash, verify};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct HashError(pub String);

impl From<bcrypt::BcryptError> for HashError {
    fn from(error: bcrypt::BcryptError) -> Self {
        HashError(error.to_string())
    }
}

/// Hashes and checks user passwords. The session manager treats this as a
/// black box.
pub trait PasswordHasher: Send + Sync {
    fn generate_hash(&self, password: &str) -> Result<String, HashError>;
    fn verify_hash(&self, password: &str, hashed_password: &str) -> Result<bool, HashError>;
}

/// bcrypt with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn generate_hash(&self, password: &str) -> Result<String, HashError> {
        Ok(hash(password, self.cost)?)
    }

    fn verify_hash(&self, password: &str, hashed_password: &str) -> Result<bool, HashError> {
        Ok(verify(password, hashed_password)?)
    }
}
