use std::path::Path;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path as UrlPath},
    http::request::Parts,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::errors::JsonApiError;

pub mod auth;
pub mod companies;
pub mod game_user_maps;
pub mod users;

use auth::ServerState;

/// Parse an `:id` segment. Ids that are not an `i32` can never match a row.
pub fn parse_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok()
}

/// Record id for the JSON API; anything unparseable is a JSON `404`.
pub struct RecordId(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let UrlPath(raw) = UrlPath::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| JsonApiError::not_found())?;
        parse_id(&raw).map(RecordId).ok_or_else(JsonApiError::not_found)
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::openapi::ApiDoc::openapi())
}

/// Build the full application router: JSON API, auth, company pages and static assets
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let index = Path::new(&state.frontend_dir).join("index.html");
    let static_dir = ServeDir::new(&state.frontend_dir).fallback(ServeFile::new(index));

    // 通用资源接口：读公开，写需认证
    let api = Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::retrieve_user)
                .put(users::update_user)
                .patch(users::partial_update_user)
                .delete(users::destroy_user),
        )
        .route("/api/game-user-maps", get(game_user_maps::list_maps).post(game_user_maps::create_map))
        .route(
            "/api/game-user-maps/:id",
            get(game_user_maps::retrieve_map)
                .put(game_user_maps::update_map)
                .patch(game_user_maps::partial_update_map)
                .delete(game_user_maps::destroy_map),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate_or_read_only,
        ));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    // 服务端渲染页面
    let pages = Router::new()
        .route("/masters", get(companies::welcome))
        .route("/masters/company/:id", get(companies::company))
        .route("/masters/new", get(companies::new_form).post(companies::submit_new));

    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json));

    public
        .merge(api)
        .merge(auth_routes)
        .merge(pages)
        .fallback_service(static_dir)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 请求到达时打点
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
