use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info, warn};

const SERVICE: &str = "metrics-admin";

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(service = SERVICE, event = "signal_failed", error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(service = SERVICE, event = "shutdown_signal", "received Ctrl+C, draining connections");
}

fn main() -> ExitCode {
    // .env first so RUST_LOG, LOG_FORMAT and CONFIG_PATH apply
    dotenv().ok();
    server::startup::init_logging();

    let cfg = match server::startup::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = SERVICE, event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let rt = match server::startup::build_runtime(&cfg.server) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = SERVICE, event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = SERVICE,
        event = "start",
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = ?cfg.server.worker_threads,
        "metrics admin service starting"
    );

    match rt.block_on(server::run_with(cfg, shutdown_signal())) {
        Ok(()) => {
            info!(service = SERVICE, event = "stop", "server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = SERVICE, event = "run_failed", error = %e, "server exited with error");
            ExitCode::FAILURE
        }
    }
}
