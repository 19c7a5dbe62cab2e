use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use service::dashboard::{DashboardOutcome, DashboardRequest};
use service::settings::ShopId;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub shop_id: Option<ShopId>,
    pub settings_redirect: Option<String>,
    pub fullscreen: Option<String>,
    #[serde(rename = "_token")]
    pub token: Option<String>,
    pub google_message_error: Option<String>,
    pub redirect: Option<String>,
}

/// Dashboard page: either the rendered app shell or a redirect to settings.
pub async fn render_app(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, ApiError> {
    let req = DashboardRequest {
        shop_id: state.shop(query.shop_id)?,
        settings_redirect: query.settings_redirect,
        fullscreen: query.fullscreen,
        admin_token: query.token,
        google_message_error: query.google_message_error,
        redirect: query.redirect,
    };

    match state.dashboard.compose(&req).await? {
        DashboardOutcome::Redirect(url) => Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response()),
        DashboardOutcome::Render { html, .. } => Ok(Html(html).into_response()),
    }
}
