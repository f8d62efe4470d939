use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::Set;

use crate::contract::model::{PhotoMeta, User, UserStatus};
use crate::infra::storage::entity::{profile_photo, user};

/// Convert a stored row to the contract model; malformed status or timestamp is an error.
pub fn user_from_entity(row: user::Model) -> anyhow::Result<User> {
    let status: UserStatus = row
        .status
        .parse()
        .with_context(|| format!("user {} has a malformed status", row.id))?;

    let updated_at = match row.updated_at.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("user {} has a malformed updated_at '{raw}'", row.id))?
            .with_timezone(&Utc),
        _ => row.created_at,
    };

    Ok(User {
        id: row.id,
        username: row.username,
        email: row.email,
        status,
        role_id: row.role_id,
        created_at: row.created_at,
        updated_at,
    })
}

pub fn user_to_active(u: User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.id),
        username: Set(u.username),
        email: Set(u.email),
        status: Set(u.status.to_string()),
        role_id: Set(u.role_id),
        created_at: Set(u.created_at),
        updated_at: Set(Some(format_stamp(u.updated_at))),
    }
}

/// RFC 3339 with microseconds, the precision the domain stamps at.
pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn photo_from_entity(row: profile_photo::Model) -> PhotoMeta {
    PhotoMeta {
        id: row.id,
        user_id: row.user_id,
        filename: row.filename,
        content_type: row.file_type,
        size: row.size,
        created_at: row.created_at,
    }
}

pub fn photo_to_active(meta: PhotoMeta) -> profile_photo::ActiveModel {
    profile_photo::ActiveModel {
        id: Set(meta.id),
        user_id: Set(meta.user_id),
        filename: Set(meta.filename),
        file_type: Set(meta.content_type),
        size: Set(meta.size),
        created_at: Set(meta.created_at),
    }
}
