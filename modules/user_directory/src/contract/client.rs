use async_trait::async_trait;

use crate::contract::ctx::CallCtx;
use crate::contract::model::{NewPhoto, NewUser, PhotoContent, PhotoMeta, User, UserPatch};

/// Public API of the user directory for other modules.
///
/// Errors are `anyhow::Error` wrapping a
/// [`UserDirectoryError`](crate::contract::UserDirectoryError); downcast to branch on the kind.
/// Every call honours the deadline and cancellation carried by `ctx`.
#[async_trait]
pub trait UserDirectoryApi: Send + Sync {
    /// List users, oldest first. `None` or `0` means the default page size.
    async fn list_users(&self, ctx: &CallCtx, limit: Option<u64>) -> anyhow::Result<Vec<User>>;

    /// Create a user on behalf of `acting_role_id`; returns the new id.
    async fn create_user(
        &self,
        ctx: &CallCtx,
        new_user: NewUser,
        acting_role_id: &str,
    ) -> anyhow::Result<String>;

    /// Apply a partial update on behalf of `acting_role_id`.
    async fn edit_user(
        &self,
        ctx: &CallCtx,
        patch: UserPatch,
        acting_role_id: &str,
    ) -> anyhow::Result<User>;

    /// Delete a user on behalf of `acting_role_id`; returns the deleted id.
    async fn delete_user(
        &self,
        ctx: &CallCtx,
        id: &str,
        acting_role_id: &str,
    ) -> anyhow::Result<String>;

    /// Store the single profile photo of a user; returns the photo id.
    async fn upload_photo(&self, ctx: &CallCtx, photo: NewPhoto) -> anyhow::Result<String>;

    async fn photo_metadata(&self, ctx: &CallCtx, user_id: &str) -> anyhow::Result<PhotoMeta>;

    async fn photo_content(&self, ctx: &CallCtx, user_id: &str) -> anyhow::Result<PhotoContent>;
}
