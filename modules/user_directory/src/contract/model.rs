use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Wire name of the administrative role.
pub const ADMIN_ROLE_NAME: &str = "ADMIN";
/// Wire name of the regular member role.
pub const MEMBER_ROLE_NAME: &str = "MEMBER";

/// Integer status code of a user account.
///
/// Persisted as its decimal string; parsed back at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserStatus(i32);

impl UserStatus {
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }
}

impl From<i32> for UserStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("status must be an integer code, got '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for UserStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| ParseStatusError(s.to_string()))
    }
}

/// Resolved role name. Only `Admin` may mutate the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleName {
    Admin,
    Member,
    Other(String),
}

impl RoleName {
    /// Map a stored role name onto the closed set; matching is exact.
    pub fn parse(name: &str) -> Self {
        match name {
            ADMIN_ROLE_NAME => Self::Admin,
            MEMBER_ROLE_NAME => Self::Member,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => ADMIN_ROLE_NAME,
            Self::Member => MEMBER_ROLE_NAME,
            Self::Other(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure user model for inter-module communication (no serde)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub status: UserStatus,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user.
/// Without `role_id` the new user inherits the acting role id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub status: UserStatus,
    pub role_id: Option<String>,
}

/// Partial update of a user. `None` or blank fields keep the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
    pub role_id: Option<String>,
}

/// Upload request for a profile photo.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub user_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub content: Bytes,
}

/// Stored profile photo metadata; the bytes live in the content store under `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMeta {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

/// Readable photo bytes together with their content type.
pub struct PhotoContent {
    pub content_type: String,
    pub size: i64,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for PhotoContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoContent")
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
