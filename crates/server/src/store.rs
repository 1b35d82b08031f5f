//! Local user persistence.
//!
//! [`UserStore`] is the seam the provisioning workflow talks to; the
//! production implementation is [`SeaOrmUserStore`]. Only the single row write
//! of each call is transactional.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use time::OffsetDateTime;

use crate::entity::user;
use crate::error::StoreError;

/// Fields of a user that is about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub active: bool,
}

/// Changes applied by an update. `active: None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub active: Option<bool>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<user::Model>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<user::Model>, StoreError>;
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    /// Inserts a row; a clash on `username`/`email` is `StoreError::UniqueViolation`.
    async fn insert(&self, user: NewUser) -> Result<user::Model, StoreError>;
    async fn update(&self, id: i64, changes: UserChanges) -> Result<user::Model, StoreError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone, Debug)]
pub struct SeaOrmUserStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmUserStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SeaOrmUserStore {
    async fn find_all(&self) -> Result<Vec<user::Model>, StoreError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<user::Model>, StoreError> {
        Ok(user::Entity::find_by_id(id).one(self.db.as_ref()).await?)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let count = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: NewUser) -> Result<user::Model, StoreError> {
        let now = OffsetDateTime::now_utc();
        let model = user::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            full_name: Set(user.full_name),
            active: Set(user.active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update(&self, id: i64, changes: UserChanges) -> Result<user::Model, StoreError> {
        let existing = user::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(StoreError::Missing(id))?;

        let mut model: user::ActiveModel = existing.into();
        model.username = Set(changes.username);
        model.email = Set(changes.email);
        model.full_name = Set(changes.full_name);
        if let Some(active) = changes.active {
            model.active = Set(active);
        }
        model.updated_at = Set(OffsetDateTime::now_utc());
        Ok(model.update(self.db.as_ref()).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = user::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;
        Ok(result.rows_affected > 0)
    }
}
