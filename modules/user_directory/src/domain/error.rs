use std::time::Duration;

use thiserror::Error;

use crate::contract::ctx::Interrupted;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("No admin found for role id '{role_id}'")]
    Unauthorized { role_id: String },

    #[error("Role '{role}' may not modify users")]
    Forbidden { role: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("No users found")]
    NoUsers,

    #[error("Role not found: '{id}'")]
    RoleNotFound { id: String },

    #[error("No profile photo for user {user_id}")]
    PhotoNotFound { user_id: String },

    #[error("User {user_id} already has a profile photo")]
    PhotoAlreadyExists { user_id: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Operation timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(role_id: impl Into<String>) -> Self {
        Self::Unauthorized {
            role_id: role_id.into(),
        }
    }

    pub fn forbidden(role: impl Into<String>) -> Self {
        Self::Forbidden { role: role.into() }
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    pub fn role_not_found(id: impl Into<String>) -> Self {
        Self::RoleNotFound { id: id.into() }
    }

    pub fn photo_not_found(user_id: impl Into<String>) -> Self {
        Self::PhotoNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn photo_already_exists(user_id: impl Into<String>) -> Self {
        Self::PhotoAlreadyExists {
            user_id: user_id.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Wrap an infrastructure failure, keeping the whole context chain.
    pub(crate) fn from_store(err: anyhow::Error) -> Self {
        Self::store(format!("{err:#}"))
    }
}

impl From<Interrupted> for DomainError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut(after) => Self::TimedOut { after },
            Interrupted::Cancelled => Self::Cancelled,
        }
    }
}
