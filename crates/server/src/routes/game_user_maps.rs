use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};

use common::pagination::PageQuery;
use service::game_user_map_service::{self, GameUserMapInput, GameUserMapRecord};

use super::RecordId;
use super::auth::{bad_body, CurrentUser, ServerState};
use crate::errors::JsonApiError;

#[utoipa::path(get, path = "/api/game-user-maps", tag = "game-user-maps", params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "page size, 1..=100")), responses((status = 200, description = "All maps", body = [crate::openapi::GameUserMapDoc])))]
pub async fn list_maps(
    State(state): State<ServerState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<GameUserMapRecord>>, JsonApiError> {
    Ok(Json(game_user_map_service::list_maps(&state.db, q.pagination()).await?))
}

#[utoipa::path(get, path = "/api/game-user-maps/{id}", tag = "game-user-maps", params(("id" = i32, Path, description = "Map id")), responses((status = 200, description = "Map", body = crate::openapi::GameUserMapDoc), (status = 404, description = "Not found")))]
pub async fn retrieve_map(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
) -> Result<Json<GameUserMapRecord>, JsonApiError> {
    game_user_map_service::get_map(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(JsonApiError::not_found)
}

/// The owner is always the authenticated caller; a `user` key in the body is ignored.
#[utoipa::path(post, path = "/api/game-user-maps", tag = "game-user-maps", request_body = crate::openapi::GameUserMapInputDoc, responses((status = 201, description = "Created", body = crate::openapi::GameUserMapDoc), (status = 400, description = "Invalid fields"), (status = 401, description = "Not authenticated")))]
pub async fn create_map(
    State(state): State<ServerState>,
    Extension(caller): Extension<CurrentUser>,
    body: Result<Json<GameUserMapInput>, JsonRejection>,
) -> Result<(StatusCode, Json<GameUserMapRecord>), JsonApiError> {
    let Json(input) = body.map_err(bad_body)?;
    let created = game_user_map_service::create_map(&state.db, &caller.owner(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/game-user-maps/{id}", tag = "game-user-maps", params(("id" = i32, Path, description = "Map id")), request_body = crate::openapi::GameUserMapInputDoc, responses((status = 200, description = "Updated", body = crate::openapi::GameUserMapDoc), (status = 404, description = "Not found")))]
pub async fn update_map(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
    body: Result<Json<GameUserMapInput>, JsonRejection>,
) -> Result<Json<GameUserMapRecord>, JsonApiError> {
    let Json(input) = body.map_err(bad_body)?;
    Ok(Json(game_user_map_service::update_map(&state.db, id, input).await?))
}

// 两个字段均可选，PATCH 与 PUT 语义一致
#[utoipa::path(patch, path = "/api/game-user-maps/{id}", tag = "game-user-maps", params(("id" = i32, Path, description = "Map id")), request_body = crate::openapi::GameUserMapInputDoc, responses((status = 200, description = "Updated", body = crate::openapi::GameUserMapDoc), (status = 404, description = "Not found")))]
pub async fn partial_update_map(
    state: State<ServerState>,
    id: RecordId,
    body: Result<Json<GameUserMapInput>, JsonRejection>,
) -> Result<Json<GameUserMapRecord>, JsonApiError> {
    update_map(state, id, body).await
}

#[utoipa::path(delete, path = "/api/game-user-maps/{id}", tag = "game-user-maps", params(("id" = i32, Path, description = "Map id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn destroy_map(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
) -> Result<StatusCode, JsonApiError> {
    if game_user_map_service::delete_map(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found())
    }
}
