#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::Service;

use server::routes::{self, auth};
use server::templates::Templates;

pub const SECRET: &str = "test-secret";

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

/// Fresh in-memory database with the schema applied, plus a router over it.
pub async fn build_app() -> anyhow::Result<(Router, DatabaseConnection)> {
    let db = connect_with_config(&DatabaseConfig::in_memory()).await?;
    migration::Migrator::up(&db, None).await?;
    let state = auth::ServerState {
        db: db.clone(),
        auth: auth::ServerAuthConfig { jwt_secret: SECRET.into(), token_ttl_hours: 1 },
        templates: Arc::new(Templates::new()?),
        frontend_dir: "frontend".into(),
    };
    Ok((routes::build_router(state, cors()), db))
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Response<Body>> {
    Ok(app.clone().call(req).await?)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => b.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&v)?))?,
        None => b.body(Body::empty())?,
    };
    Ok(req)
}

pub fn form_request(uri: &str, body: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))?)
}

pub async fn body_bytes(resp: Response<Body>) -> anyhow::Result<Vec<u8>> {
    Ok(to_bytes(resp.into_body(), usize::MAX).await?.to_vec())
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<Value> {
    Ok(serde_json::from_slice(&body_bytes(resp).await?)?)
}

pub async fn body_text(resp: Response<Body>) -> anyhow::Result<String> {
    Ok(String::from_utf8(body_bytes(resp).await?)?)
}

/// Register `username` and log in, returning the issued token.
pub async fn login_as(app: &Router, username: &str) -> anyhow::Result<String> {
    let password = "S3curePass!";
    let req = json_request("POST", "/auth/register", None, Some(json!({"username": username, "password": password})))?;
    let resp = send(app, req).await?;
    anyhow::ensure!(resp.status() == 201, "register failed: {}", resp.status());

    let req = json_request("POST", "/auth/login", None, Some(json!({"username": username, "password": password})))?;
    let resp = send(app, req).await?;
    anyhow::ensure!(resp.status() == 200, "login failed: {}", resp.status());
    let body = body_json(resp).await?;
    body["token"].as_str().map(str::to_string).ok_or_else(|| anyhow::anyhow!("no token in login response"))
}
