//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server crate can prepare the
//! settings directory without depending directly on `common`.

/// Ensure the directory holding `settings_path` exists; warn when the
/// modules directory is missing.
pub async fn ensure_env(modules_dir: &str, settings_path: &str) -> anyhow::Result<()> {
    let data_dir = common::env::parent_dir(settings_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    common::env::ensure_env(modules_dir, &data_dir).await
}
