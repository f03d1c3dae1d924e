use std::fmt;

use chrono::Utc;
use sea_orm::{entity::prelude::*, ActiveValue::NotSet, ConnectionTrait, DatabaseConnection, QueryOrder, Set, SqlErr};
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors, ModelError};
use crate::{game_user_map, user_credentials};

pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 150;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    GameUserMap,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::GameUserMap => Entity::has_many(game_user_map::Entity).into() }
    }
}

impl Related<game_user_map::Entity> for Entity {
    fn to() -> RelationDef { Relation::GameUserMap.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Writable user fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn username_chars_ok(u: &str) -> bool {
    u.chars().all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Shape checks only; uniqueness needs the database and lives in `create`/`update`.
pub fn validate(changes: &UserChanges, require_username: bool) -> Result<(), ModelError> {
    let mut errs = FieldErrors::new();
    match changes.username.as_deref() {
        None if require_username => errs.add("username", errors::REQUIRED),
        None => {}
        Some(u) if u.trim().is_empty() => errs.add("username", errors::BLANK),
        Some(u) => {
            errs.check_len("username", Some(u), USERNAME_MAX_LEN);
            if !username_chars_ok(u) { errs.add("username", USERNAME_INVALID); }
        }
    }
    errs.check_len("first_name", changes.first_name.as_deref(), NAME_MAX_LEN);
    errs.check_len("last_name", changes.last_name.as_deref(), NAME_MAX_LEN);
    errs.into_result()
}

fn username_taken() -> ModelError {
    let mut errs = FieldErrors::new();
    errs.add("username", USERNAME_TAKEN);
    ModelError::Fields(errs)
}

/// A concurrent insert can pass `ensure_username_free` and still hit the unique index.
pub(crate) fn write_error(e: DbErr) -> ModelError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => username_taken(),
        _ => ModelError::Db(e.to_string()),
    }
}

async fn ensure_username_free<C: ConnectionTrait>(db: &C, username: &str, except: Option<i32>) -> Result<(), ModelError> {
    let mut q = Entity::find().filter(Column::Username.eq(username));
    if let Some(id) = except { q = q.filter(Column::Id.ne(id)); }
    if q.one(db).await?.is_some() {
        return Err(username_taken());
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, changes: UserChanges) -> Result<Model, ModelError> {
    validate(&changes, true)?;
    let username = changes.username.unwrap_or_default();
    ensure_username_free(db, &username, None).await?;
    let am = ActiveModel {
        id: NotSet,
        username: Set(username),
        first_name: Set(changes.first_name.unwrap_or_default()),
        last_name: Set(changes.last_name.unwrap_or_default()),
        is_active: Set(true),
        date_joined: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(write_error)
}

pub async fn update(db: &DatabaseConnection, id: i32, changes: UserChanges) -> Result<Model, ModelError> {
    validate(&changes, false)?;
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::NotFound("user".into()))?
        .into();
    if let Some(u) = changes.username {
        ensure_username_free(db, &u, Some(id)).await?;
        found.username = Set(u);
    }
    if let Some(f) = changes.first_name { found.first_name = Set(f); }
    if let Some(l) = changes.last_name { found.last_name = Set(l); }
    found.update(db).await.map_err(write_error)
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Username.eq(username)).one(db).await?)
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

/// Remove the user together with its game user maps and credentials.
/// Returns false when no such user exists.
pub async fn delete_cascade<C: ConnectionTrait>(conn: &C, id: i32) -> Result<bool, ModelError> {
    game_user_map::Entity::delete_many()
        .filter(game_user_map::Column::UserId.eq(id))
        .exec(conn)
        .await?;
    user_credentials::Entity::delete_many()
        .filter(user_credentials::Column::UserId.eq(id))
        .exec(conn)
        .await?;
    let res = Entity::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}
