use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UserDirectoryApi,
    ctx::CallCtx,
    error::UserDirectoryError,
    model::{NewPhoto, NewUser, PhotoContent, PhotoMeta, User, UserPatch},
};
use crate::domain::{error::DomainError, photos::ProfilePhotos, service::UserDirectory};

/// Local implementation of the UserDirectoryApi trait that delegates to the domain services
pub struct UserDirectoryLocalClient {
    directory: Arc<UserDirectory>,
    photos: Arc<ProfilePhotos>,
}

impl UserDirectoryLocalClient {
    pub fn new(directory: Arc<UserDirectory>, photos: Arc<ProfilePhotos>) -> Self {
        Self { directory, photos }
    }
}

#[async_trait]
impl UserDirectoryApi for UserDirectoryLocalClient {
    async fn list_users(&self, ctx: &CallCtx, limit: Option<u64>) -> anyhow::Result<Vec<User>> {
        ctx.bound(self.directory.list_users(limit))
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn create_user(
        &self,
        ctx: &CallCtx,
        new_user: NewUser,
        acting_role_id: &str,
    ) -> anyhow::Result<String> {
        ctx.bound(self.directory.create_user(new_user, acting_role_id))
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn edit_user(
        &self,
        ctx: &CallCtx,
        patch: UserPatch,
        acting_role_id: &str,
    ) -> anyhow::Result<User> {
        ctx.bound(self.directory.edit_user(patch, acting_role_id))
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn delete_user(
        &self,
        ctx: &CallCtx,
        id: &str,
        acting_role_id: &str,
    ) -> anyhow::Result<String> {
        ctx.bound(self.directory.delete_user(id, acting_role_id))
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn upload_photo(&self, ctx: &CallCtx, photo: NewPhoto) -> anyhow::Result<String> {
        ctx.bound(self.photos.upload_photo(photo))
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn photo_metadata(&self, ctx: &CallCtx, user_id: &str) -> anyhow::Result<PhotoMeta> {
        ctx.bound(self.photos.get_photo_metadata(user_id))
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn photo_content(&self, ctx: &CallCtx, user_id: &str) -> anyhow::Result<PhotoContent> {
        ctx.bound(self.photos.get_photo_content(user_id))
            .await
            .map_err(map_domain_error_to_anyhow)
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn map_domain_error_to_anyhow(domain_error: DomainError) -> anyhow::Error {
    anyhow::Error::new(map_domain_error(domain_error))
}

pub(crate) fn map_domain_error(domain_error: DomainError) -> UserDirectoryError {
    match domain_error {
        e @ DomainError::InvalidArgument { .. } => UserDirectoryError::invalid_argument(e.to_string()),
        e @ DomainError::Unauthorized { .. } => UserDirectoryError::unauthorized(e.to_string()),
        e @ DomainError::Forbidden { .. } => UserDirectoryError::forbidden(e.to_string()),
        e @ (DomainError::UserNotFound { .. }
        | DomainError::NoUsers
        | DomainError::RoleNotFound { .. }
        | DomainError::PhotoNotFound { .. }) => UserDirectoryError::not_found(e.to_string()),
        e @ DomainError::PhotoAlreadyExists { .. } => UserDirectoryError::conflict(e.to_string()),
        DomainError::Store { message } => {
            tracing::error!("Store error: {}", message);
            UserDirectoryError::internal()
        }
        DomainError::TimedOut { .. } => UserDirectoryError::Timeout,
        DomainError::Cancelled => UserDirectoryError::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_one_to_one_onto_contract_kinds() {
        assert!(matches!(
            map_domain_error(DomainError::invalid_argument("id", "required")),
            UserDirectoryError::InvalidArgument { .. }
        ));
        assert!(matches!(
            map_domain_error(DomainError::unauthorized("zzz")),
            UserDirectoryError::Unauthorized { .. }
        ));
        assert!(matches!(
            map_domain_error(DomainError::forbidden("MEMBER")),
            UserDirectoryError::Forbidden { .. }
        ));
        assert!(matches!(
            map_domain_error(DomainError::NoUsers),
            UserDirectoryError::NotFound { .. }
        ));
        assert!(matches!(
            map_domain_error(DomainError::photo_already_exists("u1")),
            UserDirectoryError::Conflict { .. }
        ));
        assert_eq!(
            map_domain_error(DomainError::store("disk full")),
            UserDirectoryError::Internal
        );
        assert_eq!(
            map_domain_error(DomainError::Cancelled),
            UserDirectoryError::Cancelled
        );
    }

    #[test]
    fn not_found_message_names_the_user() {
        let err = map_domain_error(DomainError::user_not_found("u9"));
        assert_eq!(err.to_string(), "Not found: User not found: u9");
    }
}
