use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// `status` keeps the decimal string of the status code; `updated_at` is an
/// RFC 3339 string and may be NULL on rows written by older tooling.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub email: String,
    pub status: String,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
