use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::model::{NewUser, User, UserPatch, UserStatus};
use crate::infra::storage::mapper::format_stamp;

/// REST DTO for user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub status: i32,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: String,
}

/// REST DTO for user list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListDto {
    pub limit: u64,
    pub list: Vec<UserDto>,
}

/// REST DTO for query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<u64>,
}

/// REST DTO for creating a new user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserReq {
    pub username: String,
    pub email: String,
    pub status: i32,
    pub role_id: Option<String>,
}

/// Status as sent by clients: the stored string form or a bare integer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusInput {
    Code(i32),
    Text(String),
}

impl StatusInput {
    /// Blank text means "unchanged".
    pub fn into_status(self) -> Result<Option<UserStatus>, String> {
        match self {
            Self::Code(code) => Ok(Some(UserStatus::new(code))),
            Self::Text(text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => text.parse().map(Some).map_err(|e| format!("{e}")),
        }
    }
}

/// REST DTO for a partial user update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditUserReq {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub status: Option<StatusInput>,
    pub role_id: Option<String>,
}

/// Edited user in its wire shape: status is the stored string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEditDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub status: String,
    pub role_id: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdDto {
    #[serde(default)]
    pub id: String,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            status: user.status.code(),
            role_id: user.role_id,
            created_at: user.created_at,
            updated_at: format_stamp(user.updated_at),
        }
    }
}

impl From<User> for UserEditDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            status: user.status.to_string(),
            role_id: user.role_id,
            updated_at: format_stamp(user.updated_at),
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            username: req.username,
            email: req.email,
            status: UserStatus::new(req.status),
            role_id: req.role_id,
        }
    }
}

impl TryFrom<EditUserReq> for UserPatch {
    type Error = String;

    fn try_from(req: EditUserReq) -> Result<Self, Self::Error> {
        let status = match req.status {
            Some(input) => input.into_status()?,
            None => None,
        };
        Ok(Self {
            id: req.id,
            username: req.username,
            email: req.email,
            status,
            role_id: req.role_id,
        })
    }
}
