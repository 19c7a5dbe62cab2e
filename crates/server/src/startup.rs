use std::{env, future::Future, net::SocketAddr, path::Path};

use axum::Router;
use common::utils::logging::{self, LogFormat};
use configs::{AppConfig, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::{runtime, settings::file::JsonConfigurationStore};

use crate::routes;
use crate::state::AppState;

/// Install logging; `LOG_FORMAT=json` switches to structured output
pub fn init_logging() {
    logging::init_logging(LogFormat::from_env_value(env::var("LOG_FORMAT").ok().as_deref()));
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load the config named by `CONFIG_PATH` (default `config.toml`).
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config_from(&path, |key| env::var(key).ok())
}

/// Load `path` when present, otherwise defaults with `SERVER_HOST`/`SERVER_PORT`
/// overrides taken from `lookup`. A file that exists but does not parse is an error.
pub fn load_config_from(path: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<AppConfig> {
    let mut cfg = if Path::new(path).exists() {
        configs::load_from_file(path)?
    } else {
        warn!(%path, "config file not found, using defaults");
        let mut cfg = AppConfig::default();
        if let Some(host) = lookup("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg
    };
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

/// Multi-threaded runtime sized by `server.worker_threads` (tokio's default when unset)
pub fn build_runtime(server: &ServerConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = server.worker_threads.filter(|n| *n > 0) {
        builder.worker_threads(threads);
    }
    builder.build()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Build the app for a loaded config, opening the file-backed settings store
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    runtime::ensure_env(&cfg.module.modules_dir, &cfg.storage.settings_path).await?;
    let store = JsonConfigurationStore::new(&cfg.storage.settings_path).await?;
    let state = AppState::from_store(cfg, store);
    Ok(routes::build_router(state, build_cors()))
}

/// Serve the app for `cfg` until `shutdown` resolves
pub async fn run_with<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, settings = %cfg.storage.settings_path, local_assets = cfg.metrics.use_local_vue_app, "starting metrics admin server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("metrics admin server stopped");
    Ok(())
}
