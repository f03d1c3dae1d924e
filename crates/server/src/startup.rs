use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;
use models::db::{connect_with_config, DatabaseConfig};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use crate::templates::Templates;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// 优先读取 config.toml，失败时回退到环境变量
fn load_config() -> Result<AppConfig, StartupError> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config.toml unavailable, falling back to environment");
            AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
        }
    }
}

/// Assemble shared state and the router around an already connected database.
pub fn build_app(db: DatabaseConnection, cfg: &AppConfig) -> Result<Router, StartupError> {
    let templates = Templates::new().map_err(|e| StartupError::Templates(e.to_string()))?;
    let state = auth::ServerState {
        db,
        auth: auth::ServerAuthConfig {
            jwt_secret: cfg.auth.jwt_secret.clone(),
            token_ttl_hours: cfg.auth.token_ttl_hours,
        },
        templates: Arc::new(templates),
        frontend_dir: cfg.server.frontend_dir.clone(),
    };
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = load_config()?;

    common::env::ensure_env(&cfg.server.frontend_dir).await?;

    let db = connect_with_config(&DatabaseConfig::from_app(&cfg.database)).await?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await?;
        info!(event = "migrations_applied", "database schema up to date");
    }

    let app = build_app(db, &cfg)?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
