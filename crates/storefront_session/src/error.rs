//! Session storage errors.

use thiserror::Error;

/// An error raised while reading or writing a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The store was configured without any signing secret.
    #[error("session cookie requires at least one signing secret")]
    NoSecrets,

    /// The cookie name is empty or contains characters not allowed in a cookie name.
    #[error("invalid session cookie name: {0:?}")]
    InvalidCookieName(String),

    /// The serialized cookie exceeds what browsers are required to store.
    #[error("session cookie is {size} bytes, exceeding the {limit} byte limit")]
    CookieTooLarge { size: usize, limit: usize },

    /// Session data could not be encoded.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// The signing key was rejected by the MAC implementation.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),
}

/// Type alias for session results.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
