use std::time::Duration;

use thiserror::Error;

/// Failures reported by a [`CustomerRepository`](super::repository::CustomerRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique index rejected the write.
    #[error("duplicate key error")]
    DuplicateKey,
    #[error("no matching customer")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Business errors for customer workflows
#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid customer id: {0}")]
    InvalidId(String),
    #[error("email already exists")]
    EmailAlreadyExists,
    #[error("customer not found")]
    NotFound,
    #[error("invalid or already used verification token")]
    InvalidToken,
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl CustomerError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            CustomerError::Validation(_) => 1001,
            CustomerError::InvalidId(_) => 1002,
            CustomerError::EmailAlreadyExists => 1003,
            CustomerError::NotFound => 1004,
            CustomerError::InvalidToken => 1005,
            CustomerError::Timeout(_) => 1100,
            CustomerError::HashError(_) => 1101,
            CustomerError::Repository(_) => 1200,
        }
    }
}

impl From<RepositoryError> for CustomerError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::DuplicateKey => CustomerError::EmailAlreadyExists,
            RepositoryError::NotFound => CustomerError::NotFound,
            RepositoryError::Unavailable(msg) => CustomerError::Repository(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_becomes_email_conflict() {
        let e: CustomerError = RepositoryError::DuplicateKey.into();
        assert!(matches!(e, CustomerError::EmailAlreadyExists));
        assert_eq!(e.code(), 1003);
    }

    #[test]
    fn storage_message_is_preserved() {
        let e: CustomerError = RepositoryError::Unavailable("connection refused".into()).into();
        assert_eq!(e.to_string(), "repository error: connection refused");
    }
}
