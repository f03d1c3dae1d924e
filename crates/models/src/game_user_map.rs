use std::fmt;

use chrono::Utc;
use sea_orm::{entity::prelude::*, ActiveValue::NotSet, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ModelError};
use crate::user;

pub const GAME_MAX_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_user_map")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub created_on: DateTimeWithTimeZone,
    pub game: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.game)
    }
}

pub fn validate_game(game: Option<&str>) -> Result<(), ModelError> {
    let mut errs = FieldErrors::new();
    errs.check_len("game", game, GAME_MAX_LEN);
    errs.into_result()
}

/// Insert a map owned by `user_id`. `game` falls back to `""`, `created_on` to now.
pub async fn create(
    db: &DatabaseConnection,
    user_id: i32,
    game: Option<&str>,
    created_on: Option<DateTimeWithTimeZone>,
) -> Result<Model, ModelError> {
    validate_game(game)?;
    let am = ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        created_on: Set(created_on.unwrap_or_else(|| Utc::now().into())),
        game: Set(game.unwrap_or_default().to_string()),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

/// Change `game` and/or `created_on`; ownership never changes after creation.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    game: Option<&str>,
    created_on: Option<DateTimeWithTimeZone>,
) -> Result<Model, ModelError> {
    validate_game(game)?;
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::NotFound("game user map".into()))?
        .into();
    if let Some(g) = game { found.game = Set(g.to_string()); }
    if let Some(c) = created_on { found.created_on = Set(c); }
    found.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

/// All maps with their owners, ordered by id.
pub async fn list_with_owner(db: &DatabaseConnection) -> Result<Vec<(Model, Option<user::Model>)>, ModelError> {
    Ok(Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

pub async fn find_with_owner(db: &DatabaseConnection, id: i32) -> Result<Option<(Model, Option<user::Model>)>, ModelError> {
    Ok(Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await?)
}
