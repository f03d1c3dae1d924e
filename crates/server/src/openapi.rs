use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct UserDoc {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(ToSchema)]
pub struct UserInputDoc {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(ToSchema)]
pub struct GameUserMapDoc {
    pub id: i32,
    /// Owner's username; read-only.
    pub user: String,
    /// RFC 3339 timestamp
    pub created_on: String,
    pub game: String,
}

#[derive(ToSchema)]
pub struct GameUserMapInputDoc {
    pub game: Option<String>,
    pub created_on: Option<String>,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::list_users,
        crate::routes::users::retrieve_user,
        crate::routes::users::create_user,
        crate::routes::users::update_user,
        crate::routes::users::partial_update_user,
        crate::routes::users::destroy_user,
        crate::routes::game_user_maps::list_maps,
        crate::routes::game_user_maps::retrieve_map,
        crate::routes::game_user_maps::create_map,
        crate::routes::game_user_maps::update_map,
        crate::routes::game_user_maps::partial_update_map,
        crate::routes::game_user_maps::destroy_map,
    ),
    components(
        schemas(
            HealthResponse,
            UserDoc,
            UserInputDoc,
            GameUserMapDoc,
            GameUserMapInputDoc,
            RegisterRequest,
            LoginRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "game-user-maps")
    )
)]
pub struct ApiDoc;
