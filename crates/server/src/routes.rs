use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::state::AppState;

pub mod dashboard;
pub mod settings;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, dashboard page and settings API
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let admin_routes = Router::new()
        .route("/admin/metrics", get(dashboard::render_app))
        .route(
            "/admin/metrics/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route("/admin/metrics/native-stats/restore", post(settings::restore_native_stats));

    Router::new()
        .route("/health", get(health))
        .merge(admin_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
