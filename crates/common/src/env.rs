//! Environment/runtime helpers
//!
//! Sanity checks on the working directory at startup.

use tracing::warn;

/// Warn when the static frontend directory is missing; it is optional.
pub async fn ensure_env(frontend_dir: &str) -> anyhow::Result<()> {
    match tokio::fs::metadata(frontend_dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(anyhow::anyhow!("{frontend_dir} exists but is not a directory")),
        Err(_) => {
            warn!(%frontend_dir, "frontend assets directory not found; index page will 404");
            Ok(())
        }
    }
}
