use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes::{self, ApiState};
use crate::config::UserDirectoryConfig;
use crate::contract::client::UserDirectoryApi;
use crate::contract::model::ADMIN_ROLE_NAME;
use crate::domain::photos::ProfilePhotos;
use crate::domain::roles::RoleAuthority;
use crate::domain::service::{ServiceConfig, UserDirectory};
use crate::gateways::local::UserDirectoryLocalClient;
use crate::infra::content::FsContentStore;
use crate::infra::storage::{SeaOrmPhotosRepository, SeaOrmRolesRepository, SeaOrmUsersRepository};

/// The wired user directory: domain services over SeaORM repositories and a filesystem content store.
#[derive(Clone)]
pub struct UserDirectoryModule {
    directory: Arc<UserDirectory>,
    photos: Arc<ProfilePhotos>,
    config: UserDirectoryConfig,
}

impl UserDirectoryModule {
    /// Apply pending schema migrations.
    pub async fn migrate(conn: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running user_directory database migrations");
        crate::infra::storage::migrations::Migrator::up(conn, None).await?;
        info!("User directory migrations completed successfully");
        Ok(())
    }

    /// Build the module over an already migrated connection.
    ///
    /// `photo_root` is the absolute content directory; it is created if missing.
    pub async fn init(
        conn: DatabaseConnection,
        cfg: UserDirectoryConfig,
        photo_root: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        info!("Initializing user_directory module");
        cfg.validate()?;
        debug!(
            "Loaded user_directory config: default_list_limit={}, max_list_limit={}, call_timeout_ms={}",
            cfg.default_list_limit, cfg.max_list_limit, cfg.call_timeout_ms
        );

        let roles_repo = SeaOrmRolesRepository::new(conn.clone());
        if let Some(role_id) = cfg.bootstrap_admin_role_id.as_deref() {
            if roles_repo.ensure_role(role_id, ADMIN_ROLE_NAME).await? {
                info!(role_id, "Seeded bootstrap admin role");
            }
        }

        let content = FsContentStore::new(photo_root);
        content.ensure_root().await?;
        info!(photo_dir = %content.root().display(), "Photo content store ready");

        let roles = RoleAuthority::new(Arc::new(roles_repo));
        let directory = UserDirectory::new(
            Arc::new(SeaOrmUsersRepository::new(conn.clone())),
            roles,
            ServiceConfig {
                default_list_limit: cfg.default_list_limit,
                max_list_limit: cfg.max_list_limit,
            },
        );
        let photos = ProfilePhotos::new(
            directory.clone(),
            Arc::new(SeaOrmPhotosRepository::new(conn)),
            Arc::new(content),
        );

        Ok(Self {
            directory: Arc::new(directory),
            photos: Arc::new(photos),
            config: cfg,
        })
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn UserDirectoryApi> {
        Arc::new(UserDirectoryLocalClient::new(
            self.directory.clone(),
            self.photos.clone(),
        ))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering user_directory REST routes");
        routes::register_routes(
            router,
            ApiState {
                directory: self.directory.clone(),
                photos: self.photos.clone(),
                call_timeout: Duration::from_millis(self.config.call_timeout_ms),
            },
        )
    }
}
