use thiserror::Error;

use super::ctx::Interrupted;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserDirectoryError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error")]
    Internal,

    #[error("Operation timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,
}

impl UserDirectoryError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<Interrupted> for UserDirectoryError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut(_) => Self::Timeout,
            Interrupted::Cancelled => Self::Cancelled,
        }
    }
}
