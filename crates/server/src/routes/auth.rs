use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, warn};

use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::errors::AuthError;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::game_user_map_service::Owner;

use crate::errors::{JsonApiError, INVALID_TOKEN, NOT_AUTHENTICATED};
use crate::templates::Templates;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub templates: Arc<Templates>,
    pub frontend_dir: String,
}

impl ServerState {
    pub fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository { db: self.db.clone() });
        let mut cfg = AuthConfig::with_secret(self.auth.jwt_secret.clone());
        cfg.token_ttl_hours = self.auth.token_ttl_hours;
        AuthService::new(repo, cfg)
    }
}

/// Caller identity resolved by the auth middleware and stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

impl CurrentUser {
    pub fn owner(&self) -> Owner {
        Owner { id: self.id, username: self.username.clone() }
    }
}

impl From<AuthUser> for CurrentUser {
    fn from(u: AuthUser) -> Self {
        Self { id: u.id, username: u.username }
    }
}

#[derive(Serialize)]
pub struct MeOutput {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<AuthUser> for MeOutput {
    fn from(u: AuthUser) -> Self {
        Self { id: u.id, username: u.username, first_name: u.first_name, last_name: u.last_name }
    }
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub id: i32,
    pub username: String,
    pub token: String,
}

fn auth_error(e: AuthError) -> JsonApiError {
    debug!(code = e.code(), error = %e, "auth error");
    match e {
        AuthError::Validation(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
        AuthError::Conflict => JsonApiError::detail(StatusCode::CONFLICT, "A user with that username already exists."),
        AuthError::Unauthorized | AuthError::TokenError(_) => {
            JsonApiError::unauthorized(INVALID_TOKEN)
        }
        other => JsonApiError::internal(other),
    }
}

pub(crate) fn bad_body(rej: JsonRejection) -> JsonApiError {
    JsonApiError::new(StatusCode::BAD_REQUEST, "Malformed request body", Some(rej.body_text()))
}

/// 读取 Authorization: Bearer <token>；缺失时回退到 auth_token Cookie
fn extract_token(headers: &HeaderMap) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION) {
        let value = h.to_str().unwrap_or_default();
        return match value.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => {
                warn!("invalid Authorization format (expect Bearer)");
                Err(JsonApiError::unauthorized(INVALID_TOKEN))
            }
        };
    }
    let jar = CookieJar::from_headers(headers);
    Ok(jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty()))
}

async fn resolve_caller(state: &ServerState, token: &str) -> Result<CurrentUser, JsonApiError> {
    state
        .auth_service()
        .authenticate(token)
        .await
        .map(CurrentUser::from)
        .map_err(|e| match e {
            AuthError::Repository(_) => JsonApiError::internal(e),
            other => {
                warn!(error = %other, "token validation failed");
                JsonApiError::unauthorized(INVALID_TOKEN)
            }
        })
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// 读操作对所有人开放，写操作要求已认证；携带的 token 无效时一律 401
pub async fn authenticate_or_read_only(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    match extract_token(req.headers())? {
        Some(token) => {
            let caller = resolve_caller(&state, &token).await?;
            req.extensions_mut().insert(caller);
        }
        None if !is_safe(req.method()) => {
            warn!(method = %req.method(), path = %req.uri().path(), "unauthenticated write rejected");
            return Err(JsonApiError::unauthorized(NOT_AUTHENTICATED));
        }
        None => {}
    }
    Ok(next.run(req).await)
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered", body = crate::openapi::UserDoc), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<MeOutput>), JsonApiError> {
    let Json(input) = body.map_err(bad_body)?;
    let user = state.auth_service().register(input).await.map_err(auth_error)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let Json(input) = body.map_err(bad_body)?;
    let session = state.auth_service().login(input).await.map_err(|e| match e {
        AuthError::Unauthorized => JsonApiError::unauthorized("Invalid username or password."),
        other => auth_error(other),
    })?;
    let token = session
        .token
        .ok_or_else(|| JsonApiError::internal("token generation failed"))?;

    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let out = LoginOutput { id: session.user.id, username: session.user.username, token };
    Ok((jar.add(cookie), Json(out)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user", body = crate::openapi::UserDoc), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, headers: HeaderMap) -> Result<Json<MeOutput>, JsonApiError> {
    let token = extract_token(&headers)?.ok_or_else(|| JsonApiError::unauthorized(NOT_AUTHENTICATED))?;
    let user = state.auth_service().authenticate(&token).await.map_err(auth_error)?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        h.insert(header::COOKIE, HeaderValue::from_static("auth_token=xyz"));
        assert_eq!(extract_token(&h).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_fallback_and_absence() {
        let mut h = HeaderMap::new();
        assert!(extract_token(&h).unwrap().is_none());
        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=xyz"));
        assert_eq!(extract_token(&h).unwrap().as_deref(), Some("xyz"));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        let err = extract_token(&h).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn safe_methods() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::OPTIONS));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }
}
