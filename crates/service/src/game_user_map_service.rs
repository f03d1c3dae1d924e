use chrono::DateTime;
use sea_orm::{entity::prelude::DateTimeWithTimeZone, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use common::pagination::Pagination;
use models::errors::FieldErrors;
use models::{game_user_map, user};
use crate::errors::ServiceError;

pub const DATETIME_FORMAT_ERROR: &str =
    "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// Wire representation of a game user map; `user` is the owner's display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameUserMapRecord {
    pub id: i32,
    pub user: String,
    pub created_on: DateTimeWithTimeZone,
    pub game: String,
}

impl GameUserMapRecord {
    fn from_pair((m, owner): (game_user_map::Model, Option<user::Model>)) -> Self {
        Self {
            id: m.id,
            user: owner.map(|u| u.to_string()).unwrap_or_default(),
            created_on: m.created_on,
            game: m.game,
        }
    }
}

/// Writable fields. The owner is never taken from the payload; a `user` key is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameUserMapInput {
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

/// The authenticated caller that becomes the owner of new records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: i32,
    pub username: String,
}

fn parse_created_on(raw: Option<&str>) -> Result<Option<DateTimeWithTimeZone>, ServiceError> {
    match raw {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s.trim()).map(Some).map_err(|_| {
            let mut errs = FieldErrors::new();
            errs.add("created_on", DATETIME_FORMAT_ERROR);
            ServiceError::Invalid(errs)
        }),
    }
}

pub async fn list_maps(db: &DatabaseConnection, page: Option<Pagination>) -> Result<Vec<GameUserMapRecord>, ServiceError> {
    let rows = match page {
        Some(p) => {
            let (page_idx, per_page) = p.normalize();
            game_user_map::Entity::find()
                .find_also_related(user::Entity)
                .order_by_asc(game_user_map::Column::Id)
                .paginate(db, per_page)
                .fetch_page(page_idx)
                .await?
        }
        None => game_user_map::list_with_owner(db).await?,
    };
    Ok(rows.into_iter().map(GameUserMapRecord::from_pair).collect())
}

pub async fn get_map(db: &DatabaseConnection, id: i32) -> Result<Option<GameUserMapRecord>, ServiceError> {
    Ok(game_user_map::find_with_owner(db, id).await?.map(GameUserMapRecord::from_pair))
}

/// Create a map owned by `owner`, whatever the payload says.
#[instrument(skip(db, input), fields(owner_id = owner.id))]
pub async fn create_map(db: &DatabaseConnection, owner: &Owner, input: GameUserMapInput) -> Result<GameUserMapRecord, ServiceError> {
    let created_on = parse_created_on(input.created_on.as_deref())?;
    let m = game_user_map::create(db, owner.id, input.game.as_deref(), created_on).await?;
    info!(map_id = m.id, owner_id = owner.id, game = %m.game, event = "game_user_map_created", "game user map created");
    Ok(GameUserMapRecord {
        id: m.id,
        user: owner.username.clone(),
        created_on: m.created_on,
        game: m.game,
    })
}

/// Update `game`/`created_on`. Both fields are optional, so full and partial updates coincide.
#[instrument(skip(db, input))]
pub async fn update_map(db: &DatabaseConnection, id: i32, input: GameUserMapInput) -> Result<GameUserMapRecord, ServiceError> {
    let created_on = parse_created_on(input.created_on.as_deref())?;
    game_user_map::update(db, id, input.game.as_deref(), created_on).await?;
    let rec = get_map(db, id).await?.ok_or_else(|| ServiceError::not_found("game user map"))?;
    info!(map_id = id, event = "game_user_map_updated", "game user map updated");
    Ok(rec)
}

#[instrument(skip(db))]
pub async fn delete_map(db: &DatabaseConnection, id: i32) -> Result<bool, ServiceError> {
    let res = game_user_map::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
