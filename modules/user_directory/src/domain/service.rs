use std::sync::Arc;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use crate::domain::roles::{require_admin, RoleAuthority};

/// Domain service with business rules for user management.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct UserDirectory {
    repo: Arc<dyn UsersRepository>,
    roles: RoleAuthority,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_list_limit: u64,
    pub max_list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_list_limit: 10,
            max_list_limit: 1000,
        }
    }
}

impl UserDirectory {
    pub fn new(repo: Arc<dyn UsersRepository>, roles: RoleAuthority, config: ServiceConfig) -> Self {
        Self {
            repo,
            roles,
            config,
        }
    }

    #[instrument(name = "user_directory.service.list_users", skip(self))]
    pub async fn list_users(&self, limit: Option<u64>) -> Result<Vec<User>, DomainError> {
        let limit = self.effective_limit(limit);
        debug!(limit, "Listing users");

        let users = self.repo.list(limit).await.map_err(DomainError::from_store)?;
        if users.is_empty() {
            return Err(DomainError::NoUsers);
        }

        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(
        name = "user_directory.service.create_user",
        skip(self, new_user),
        fields(username = %new_user.username, acting_role_id = %acting_role_id)
    )]
    pub async fn create_user(
        &self,
        new_user: NewUser,
        acting_role_id: &str,
    ) -> Result<String, DomainError> {
        info!("Creating new user");

        let role = self.roles.acting_role(acting_role_id).await?;
        require_admin(&role)?;

        validate_username(&new_user.username)?;
        validate_email(&new_user.email)?;

        let role_id = match non_blank(new_user.role_id) {
            Some(role_id) => {
                self.roles.ensure_exists(&role_id).await?;
                role_id
            }
            None => acting_role_id.to_string(),
        };

        let now = stamp_now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            email: new_user.email,
            status: new_user.status,
            role_id,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .insert(user.clone())
            .await
            .map_err(DomainError::from_store)?;

        info!(user_id = %user.id, "Successfully created user");
        Ok(user.id)
    }

    #[instrument(
        name = "user_directory.service.edit_user",
        skip(self, patch),
        fields(user_id = %patch.id, acting_role_id = %acting_role_id)
    )]
    pub async fn edit_user(
        &self,
        patch: UserPatch,
        acting_role_id: &str,
    ) -> Result<User, DomainError> {
        info!("Editing user");

        if patch.id.trim().is_empty() {
            return Err(DomainError::invalid_argument("id", "user id is required"));
        }

        let role = self.roles.acting_role(acting_role_id).await?;
        let current = self.load_user(&patch.id).await?;
        require_admin(&role)?;

        // Stored values the patch leaves alone are carried over as they are.
        validate_patch(&patch)?;
        let mut merged = apply_patch(current.clone(), patch);
        if merged.role_id != current.role_id {
            self.roles.ensure_exists(&merged.role_id).await?;
        }

        merged.updated_at = next_stamp(current.updated_at);

        self.repo
            .update(merged.clone())
            .await
            .map_err(DomainError::from_store)?;

        info!("Successfully edited user");
        Ok(merged)
    }

    #[instrument(
        name = "user_directory.service.delete_user",
        skip(self),
        fields(user_id = %id, acting_role_id = %acting_role_id)
    )]
    pub async fn delete_user(&self, id: &str, acting_role_id: &str) -> Result<String, DomainError> {
        info!("Deleting user");

        if id.trim().is_empty() {
            return Err(DomainError::invalid_argument("id", "user id is required"));
        }

        let role = self.roles.acting_role(acting_role_id).await?;
        self.load_user(id).await?;
        require_admin(&role)?;

        let deleted = self.repo.delete(id).await.map_err(DomainError::from_store)?;
        if !deleted {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully deleted user");
        Ok(id.to_string())
    }

    /// Page size actually applied for a requested `limit`.
    pub fn effective_limit(&self, limit: Option<u64>) -> u64 {
        match limit {
            None | Some(0) => self.config.default_list_limit,
            Some(n) => n.min(self.config.max_list_limit),
        }
    }

    /// Existence check used by the photo store.
    pub async fn user_exists(&self, id: &str) -> Result<bool, DomainError> {
        if id.trim().is_empty() {
            return Ok(false);
        }
        self.repo.exists(id).await.map_err(DomainError::from_store)
    }

    async fn load_user(&self, id: &str) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::user_not_found(id))
    }
}

// --- helpers ---

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Blank or absent fields keep the stored value.
fn apply_patch(mut current: User, patch: UserPatch) -> User {
    if let Some(username) = non_blank(patch.username) {
        current.username = username;
    }
    if let Some(email) = non_blank(patch.email) {
        current.email = email;
    }
    if let Some(status) = patch.status {
        current.status = status;
    }
    if let Some(role_id) = non_blank(patch.role_id) {
        current.role_id = role_id;
    }
    current
}

fn validate_patch(patch: &UserPatch) -> Result<(), DomainError> {
    if let Some(email) = patch.email.as_deref().filter(|e| !e.trim().is_empty()) {
        validate_email(email)?;
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.trim().is_empty() {
        return Err(DomainError::invalid_argument(
            "username",
            "username cannot be empty",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    if !email.contains('@') {
        return Err(DomainError::invalid_argument(
            "email",
            format!("'{email}' is not an email address"),
        ));
    }
    Ok(())
}

/// Current time at the precision the store keeps.
pub(crate) fn stamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A stamp strictly later than `previous`.
fn next_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = stamp_now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}
