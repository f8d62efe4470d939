//! SeaORM-backed repository implementations for the domain ports.
//!
//! Each struct is generic over `C: ConnectionTrait`, so it can be built over a
//! `DatabaseConnection` **or** a transaction.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::contract::model::{PhotoMeta, User};
use crate::domain::repo::{PhotosRepository, RolesRepository, UsersRepository};
use crate::infra::storage::entity::{profile_photo, role, user};
use crate::infra::storage::mapper::{photo_from_entity, photo_to_active, user_from_entity, user_to_active};

/// SeaORM users repository.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list(&self, limit: u64) -> anyhow::Result<Vec<User>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("list users failed")?;
        rows.into_iter().map(user_from_entity).collect()
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id.to_owned())
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        found.map(user_from_entity).transpose()
    }

    async fn exists(&self, id: &str) -> anyhow::Result<bool> {
        let username: Option<String> = user::Entity::find_by_id(id.to_owned())
            .select_only()
            .column(user::Column::Username)
            .into_tuple()
            .one(&self.conn)
            .await
            .context("user existence check failed")?;
        Ok(username.is_some_and(|name| !name.is_empty()))
    }

    async fn insert(&self, u: User) -> anyhow::Result<()> {
        let _ = user_to_active(u)
            .insert(&self.conn)
            .await
            .context("insert user failed")?;
        Ok(())
    }

    async fn update(&self, u: User) -> anyhow::Result<()> {
        let mut m = user_to_active(u);
        // created_at is immutable
        m.created_at = sea_orm::ActiveValue::NotSet;
        let _ = m.update(&self.conn).await.context("update user failed")?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let res = user::Entity::delete_by_id(id.to_owned())
            .exec(&self.conn)
            .await
            .context("delete user failed")?;
        Ok(res.rows_affected > 0)
    }
}

/// SeaORM roles repository.
pub struct SeaOrmRolesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmRolesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Insert the role unless a row with this id already exists. Returns true when inserted.
    pub async fn ensure_role(&self, id: &str, name: &str) -> anyhow::Result<bool> {
        let existing = role::Entity::find_by_id(id.to_owned())
            .one(&self.conn)
            .await
            .context("role lookup failed")?;
        if existing.is_some() {
            return Ok(false);
        }

        let m = role::ActiveModel {
            id: Set(id.to_owned()),
            name: Set(name.to_owned()),
        };
        let _ = m.insert(&self.conn).await.context("insert role failed")?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl<C> RolesRepository for SeaOrmRolesRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_name(&self, id: &str) -> anyhow::Result<Option<String>> {
        let found = role::Entity::find_by_id(id.to_owned())
            .one(&self.conn)
            .await
            .context("find role failed")?;
        Ok(found.map(|r| r.name))
    }
}

/// SeaORM profile photo metadata repository.
pub struct SeaOrmPhotosRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmPhotosRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> PhotosRepository for SeaOrmPhotosRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Option<PhotoMeta>> {
        let found = profile_photo::Entity::find()
            .filter(profile_photo::Column::UserId.eq(user_id))
            .order_by_asc(profile_photo::Column::CreatedAt)
            .one(&self.conn)
            .await
            .context("find photo by user failed")?;
        Ok(found.map(photo_from_entity))
    }

    async fn insert(&self, meta: PhotoMeta) -> anyhow::Result<()> {
        let _ = photo_to_active(meta)
            .insert(&self.conn)
            .await
            .context("insert photo failed")?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let res = profile_photo::Entity::delete_by_id(id.to_owned())
            .exec(&self.conn)
            .await
            .context("delete photo failed")?;
        Ok(res.rows_affected > 0)
    }
}
