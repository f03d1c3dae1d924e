use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};

use common::pagination::PageQuery;
use models::user::UserChanges;
use service::user_service::{self, UserRecord};

use super::RecordId;
use super::auth::{bad_body, ServerState};
use crate::errors::JsonApiError;

#[utoipa::path(get, path = "/api/users", tag = "users", params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "page size, 1..=100")), responses((status = 200, description = "All users", body = [crate::openapi::UserDoc])))]
pub async fn list_users(
    State(state): State<ServerState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<UserRecord>>, JsonApiError> {
    Ok(Json(user_service::list_users(&state.db, q.pagination()).await?))
}

#[utoipa::path(get, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), responses((status = 200, description = "User", body = crate::openapi::UserDoc), (status = 404, description = "Not found")))]
pub async fn retrieve_user(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
) -> Result<Json<UserRecord>, JsonApiError> {
    user_service::get_user(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(JsonApiError::not_found)
}

#[utoipa::path(post, path = "/api/users", tag = "users", request_body = crate::openapi::UserInputDoc, responses((status = 201, description = "Created", body = crate::openapi::UserDoc), (status = 400, description = "Invalid fields"), (status = 401, description = "Not authenticated")))]
pub async fn create_user(
    State(state): State<ServerState>,
    body: Result<Json<UserChanges>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), JsonApiError> {
    let Json(changes) = body.map_err(bad_body)?;
    let created = user_service::create_user(&state.db, changes).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), request_body = crate::openapi::UserInputDoc, responses((status = 200, description = "Updated", body = crate::openapi::UserDoc), (status = 400, description = "Invalid fields"), (status = 404, description = "Not found")))]
pub async fn update_user(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
    body: Result<Json<UserChanges>, JsonRejection>,
) -> Result<Json<UserRecord>, JsonApiError> {
    let Json(changes) = body.map_err(bad_body)?;
    Ok(Json(user_service::update_user(&state.db, id, changes, false).await?))
}

#[utoipa::path(patch, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), request_body = crate::openapi::UserInputDoc, responses((status = 200, description = "Updated", body = crate::openapi::UserDoc), (status = 404, description = "Not found")))]
pub async fn partial_update_user(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
    body: Result<Json<UserChanges>, JsonRejection>,
) -> Result<Json<UserRecord>, JsonApiError> {
    let Json(changes) = body.map_err(bad_body)?;
    Ok(Json(user_service::update_user(&state.db, id, changes, true).await?))
}

#[utoipa::path(delete, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn destroy_user(
    State(state): State<ServerState>,
    RecordId(id): RecordId,
) -> Result<StatusCode, JsonApiError> {
    if user_service::delete_user(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found())
    }
}
