#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;

use user_directory::{
    contract::model::{NewUser, UserStatus},
    domain::{
        photos::ProfilePhotos,
        ports::PhotoContentStore,
        roles::RoleAuthority,
        service::{ServiceConfig, UserDirectory},
    },
    infra::{
        content::FsContentStore,
        storage::{
            entity::{profile_photo, role, user},
            migrations::Migrator,
            SeaOrmPhotosRepository, SeaOrmRolesRepository, SeaOrmUsersRepository,
        },
    },
};

pub const ADMIN: &str = "r1";
pub const MEMBER: &str = "r2";

/// Fresh in-memory SQLite with migrations applied and the two standard roles seeded.
pub async fn test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    for (id, name) in [(ADMIN, "ADMIN"), (MEMBER, "MEMBER")] {
        role::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
        }
        .insert(&db)
        .await
        .expect("Failed to seed role");
    }
    db
}

pub struct Fixture {
    pub db: DatabaseConnection,
    pub directory: Arc<UserDirectory>,
    pub photos: Arc<ProfilePhotos>,
    pub photo_dir: TempDir,
}

pub fn build_directory(db: &DatabaseConnection) -> UserDirectory {
    let roles = RoleAuthority::new(Arc::new(SeaOrmRolesRepository::new(db.clone())));
    UserDirectory::new(
        Arc::new(SeaOrmUsersRepository::new(db.clone())),
        roles,
        ServiceConfig::default(),
    )
}

pub fn build_photos(
    db: &DatabaseConnection,
    directory: &UserDirectory,
    content: Arc<dyn PhotoContentStore>,
) -> ProfilePhotos {
    ProfilePhotos::new(
        directory.clone(),
        Arc::new(SeaOrmPhotosRepository::new(db.clone())),
        content,
    )
}

pub async fn fixture() -> Fixture {
    let db = test_db().await;
    let photo_dir = tempfile::tempdir().expect("tempdir");
    let directory = build_directory(&db);
    let photos = build_photos(
        &db,
        &directory,
        Arc::new(FsContentStore::new(photo_dir.path())),
    );
    Fixture {
        db,
        directory: Arc::new(directory),
        photos: Arc::new(photos),
        photo_dir,
    }
}

pub fn new_user(username: &str, email: &str, status: i32) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        status: UserStatus::new(status),
        role_id: None,
    }
}

/// Insert a row directly, bypassing the service.
pub async fn insert_user_row(
    db: &DatabaseConnection,
    id: &str,
    username: &str,
    created_at: DateTime<Utc>,
    updated_at: Option<&str>,
) {
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        status: Set("1".to_string()),
        role_id: Set(ADMIN.to_string()),
        created_at: Set(created_at),
        updated_at: Set(updated_at.map(str::to_string)),
    }
    .insert(db)
    .await
    .expect("Failed to insert user row");
}

/// Overwrite the stored email as-is, bypassing domain validation.
pub async fn set_stored_email(db: &DatabaseConnection, id: &str, email: &str) {
    user::ActiveModel {
        id: Set(id.to_string()),
        email: Set(email.to_string()),
        ..Default::default()
    }
    .update(db)
    .await
    .expect("Failed to overwrite email");
}

pub async fn user_count(db: &DatabaseConnection) -> u64 {
    user::Entity::find().count(db).await.expect("count users")
}

pub async fn photo_rows_for(db: &DatabaseConnection, user_id: &str) -> u64 {
    profile_photo::Entity::find()
        .filter(profile_photo::Column::UserId.eq(user_id))
        .count(db)
        .await
        .expect("count photos")
}

pub async fn stored_user(db: &DatabaseConnection, id: &str) -> Option<user::Model> {
    user::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .expect("load user row")
}
