use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use common::pagination::Pagination;
use models::errors::{self, FieldErrors};
use models::user::{self, UserChanges};
use crate::errors::ServiceError;

/// Wire representation of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserRecord {
    fn from(m: user::Model) -> Self {
        Self { id: m.id, username: m.username, first_name: m.first_name, last_name: m.last_name }
    }
}

/// List users ordered by id; the whole table unless a page is requested.
pub async fn list_users(db: &DatabaseConnection, page: Option<Pagination>) -> Result<Vec<UserRecord>, ServiceError> {
    let query = user::Entity::find().order_by_asc(user::Column::Id);
    let rows = match page {
        Some(p) => {
            let (page_idx, per_page) = p.normalize();
            query.paginate(db, per_page).fetch_page(page_idx).await?
        }
        None => query.all(db).await?,
    };
    Ok(rows.into_iter().map(UserRecord::from).collect())
}

/// Get a user by id.
pub async fn get_user(db: &DatabaseConnection, id: i32) -> Result<Option<UserRecord>, ServiceError> {
    let found = user::Entity::find_by_id(id).one(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(found.map(UserRecord::from))
}

/// Create a user without credentials.
#[instrument(skip(db, changes), fields(username = ?changes.username))]
pub async fn create_user(db: &DatabaseConnection, changes: UserChanges) -> Result<UserRecord, ServiceError> {
    let created = user::create(db, changes).await?;
    info!(user_id = created.id, event = "user_created", "user created");
    Ok(created.into())
}

/// Full (`partial = false`) or partial update. A full update needs `username`.
#[instrument(skip(db, changes))]
pub async fn update_user(db: &DatabaseConnection, id: i32, changes: UserChanges, partial: bool) -> Result<UserRecord, ServiceError> {
    if !partial && changes.username.is_none() {
        let mut errs = FieldErrors::new();
        errs.add("username", errors::REQUIRED);
        return Err(ServiceError::Invalid(errs));
    }
    let updated = user::update(db, id, changes).await?;
    info!(user_id = updated.id, event = "user_updated", "user updated");
    Ok(updated.into())
}

/// Delete a user and everything it owns. Returns false if it did not exist.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, id: i32) -> Result<bool, ServiceError> {
    let txn = db.begin().await?;
    let deleted = user::delete_cascade(&txn, id).await?;
    txn.commit().await?;
    if deleted {
        info!(user_id = id, event = "user_deleted", "user and owned records deleted");
    }
    Ok(deleted)
}
