//! Domain error model.

use thiserror::Error;

/// Result type used across the console core.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a rejected operation result: the store that produced it
/// has not changed any state. Nothing in the core retries on these errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A lookup by id or email found nothing.
    #[error("{0} not found")]
    NotFound(String),

    /// The supplied password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A record with the same unique key is already registered.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Caller-supplied data failed a store-level invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The scheduler was torn down before the operation completed.
    #[error("operation interrupted before completion")]
    Interrupted,
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
