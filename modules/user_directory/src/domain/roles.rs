use std::sync::Arc;

use tracing::{debug, instrument};

use crate::contract::model::RoleName;
use crate::domain::error::DomainError;
use crate::domain::repo::RolesRepository;

/// Resolves role ids to role names and answers the admin question.
#[derive(Clone)]
pub struct RoleAuthority {
    repo: Arc<dyn RolesRepository>,
}

impl RoleAuthority {
    pub fn new(repo: Arc<dyn RolesRepository>) -> Self {
        Self { repo }
    }

    /// Look up the name of `role_id`. Blank ids never reach the store.
    #[instrument(name = "user_directory.roles.resolve_role", skip(self), fields(role_id = %role_id))]
    pub async fn resolve_role(&self, role_id: &str) -> Result<RoleName, DomainError> {
        if role_id.trim().is_empty() {
            return Err(DomainError::role_not_found(role_id));
        }

        let name = self
            .repo
            .find_name(role_id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::role_not_found(role_id))?;

        debug!(role = %name, "Resolved role");
        Ok(RoleName::parse(&name))
    }

    /// Resolve the role of the caller. An unknown id means the caller is unauthorized.
    pub async fn acting_role(&self, acting_role_id: &str) -> Result<RoleName, DomainError> {
        match self.resolve_role(acting_role_id).await {
            Err(DomainError::RoleNotFound { .. }) => Err(DomainError::unauthorized(acting_role_id)),
            other => other,
        }
    }

    /// Fails with InvalidArgument when `role_id` does not name a stored role.
    pub async fn ensure_exists(&self, role_id: &str) -> Result<(), DomainError> {
        match self.resolve_role(role_id).await {
            Ok(_) => Ok(()),
            Err(DomainError::RoleNotFound { .. }) => Err(DomainError::invalid_argument(
                "role_id",
                format!("unknown role '{role_id}'"),
            )),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn require_admin(role: &RoleName) -> Result<(), DomainError> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(role.as_str()))
    }
}
