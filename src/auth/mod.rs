//! Credentials: password hashing and bearer tokens.

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner};

/// Errors raised while hashing passwords or checking tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
