//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure the settings data directory exists; warn when the module install
/// directory is missing since local assets and source maps will not resolve.
pub async fn ensure_env(modules_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(modules_dir).await.is_err() {
        warn!(%modules_dir, "modules directory not found; local assets will not resolve");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

/// Parent directory of a file path, if it has a non-empty one.
pub fn parent_dir(path: &str) -> Option<&Path> {
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}
