use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::types::Ack;
use service::settings::{SettingsRecord, ShopId, ToggledModules};

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub shop_id: Option<ShopId>,
}

/// Partial settings update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsUpdate {
    pub first_time_onboarded: Option<bool>,
    pub account_linked: Option<bool>,
    pub google_tag_linked: Option<bool>,
    pub dashboard_modules_toggled: Option<ToggledModules>,
}

impl SettingsUpdate {
    fn is_empty(&self) -> bool {
        self.first_time_onboarded.is_none()
            && self.account_linked.is_none()
            && self.google_tag_linked.is_none()
            && self.dashboard_modules_toggled.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct RestoreOutput {
    pub restored: Vec<String>,
}

pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<SettingsRecord>, ApiError> {
    let record = state.settings.snapshot(state.shop(query.shop_id)?).await?;
    Ok(Json(record))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Ack>, ApiError> {
    let shop_id = state.shop(query.shop_id)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("no setting to update".into()));
    }
    let settings = &state.settings;

    let mut ok = true;
    if let Some(v) = update.first_time_onboarded {
        ok &= settings.set_first_time_onboarded(shop_id, v).await?;
    }
    if let Some(v) = update.account_linked {
        ok &= settings.set_account_linked(shop_id, v).await?;
    }
    if let Some(v) = update.google_tag_linked {
        ok &= settings.set_google_tag_linked(shop_id, v).await?;
    }
    if let Some(modules) = update.dashboard_modules_toggled {
        ok &= settings.set_dashboard_modules_toggled(shop_id, modules.as_slice()).await?;
    }

    info!(shop_id, ok, "settings updated");
    Ok(Json(Ack { ok }))
}

pub async fn restore_native_stats(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<RestoreOutput>, ApiError> {
    let restored = state.native_stats.restore(state.shop(query.shop_id)?).await?;
    Ok(Json(RestoreOutput { restored }))
}
