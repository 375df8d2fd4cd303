//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::validation::ValidationErrors;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// The message shown to the client. Never reveals which part of a
    /// credential pair was wrong.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Please correct the highlighted fields",
            Self::InvalidCredentials => "Invalid email or password",
            Self::UserAlreadyExists => "An account with this email already exists",
            Self::Repository(_) | Self::PasswordHash => "Something went wrong. Please try again.",
        }
    }
}
