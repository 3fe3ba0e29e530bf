//! Authentication error types.

use store::StoreError;
use thiserror::Error;

use crate::error::ValidationError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// Unknown email or wrong password. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated.
    #[error("account disabled")]
    AccountDisabled,

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Store error.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(_) => AuthError::EmailTaken,
            other => AuthError::Store(other),
        }
    }
}
