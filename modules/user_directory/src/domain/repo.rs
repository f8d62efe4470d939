use async_trait::async_trait;

use crate::contract::model::{PhotoMeta, User};

/// Port for the domain layer: user persistence.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// First `limit` users ordered by creation time, then id.
    async fn list(&self, limit: u64) -> anyhow::Result<Vec<User>>;
    /// Load a user by id.
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>>;
    /// True when a row with a non-empty username exists.
    async fn exists(&self, id: &str) -> anyhow::Result<bool>;
    /// Insert a fully-formed domain user.
    ///
    /// Service computes id/timestamps/validation; repo persists.
    async fn insert(&self, u: User) -> anyhow::Result<()>;
    /// Update an existing user (by primary key in `u.id`).
    async fn update(&self, u: User) -> anyhow::Result<()>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

/// Read side of the role table.
#[async_trait]
pub trait RolesRepository: Send + Sync {
    /// Stored name of the role, if the id exists.
    async fn find_name(&self, id: &str) -> anyhow::Result<Option<String>>;
}

/// Photo metadata persistence.
#[async_trait]
pub trait PhotosRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Option<PhotoMeta>>;
    async fn insert(&self, meta: PhotoMeta) -> anyhow::Result<()>;
    /// Delete by photo id. Returns true if a row was deleted.
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}
