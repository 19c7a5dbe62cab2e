use std::sync::Arc;

use service::collaborators::{
    accounts::StoreBackedAccounts, assets::FsAssetProbe, links::RouteTableLinks, locale::StaticLocale,
    render::HtmlShellRenderer,
};
use service::dashboard::{DashboardCollaborators, DashboardConfig, DashboardService};
use service::native_stats::{NativeStatsHandler, StoreBackedModules};
use service::settings::{ConfigurationRepository, ConfigurationStore, ShopId, GLOBAL_SHOP};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ConfigurationRepository>,
    pub dashboard: Arc<DashboardService>,
    pub native_stats: Arc<NativeStatsHandler>,
    pub default_shop_id: ShopId,
}

impl AppState {
    /// Wire the shipped collaborators around one configuration store.
    pub fn from_store(cfg: &configs::AppConfig, store: Arc<dyn ConfigurationStore>) -> Self {
        let settings = Arc::new(ConfigurationRepository::new(Arc::clone(&store)));
        let native_stats = Arc::new(NativeStatsHandler::new(
            Arc::clone(&settings),
            Arc::new(StoreBackedModules::new(Arc::clone(&store))),
        ));
        let accounts = Arc::new(StoreBackedAccounts::new(store));
        let deps = DashboardCollaborators {
            accounts: accounts.clone(),
            installer: accounts,
            native_stats: Arc::clone(&native_stats),
            links: Arc::new(RouteTableLinks::default()),
            locale: Arc::new(StaticLocale::from_config(&cfg.shop)),
            renderer: Arc::new(HtmlShellRenderer),
            probe: Arc::new(FsAssetProbe),
        };
        let dashboard = Arc::new(DashboardService::new(deps, DashboardConfig::from_app_config(cfg)));
        Self { settings, dashboard, native_stats, default_shop_id: cfg.shop.default_shop_id }
    }

    /// Shop addressed by a request; the host-wide scope is not a shop.
    pub fn shop(&self, requested: Option<ShopId>) -> Result<ShopId, ApiError> {
        match requested {
            Some(GLOBAL_SHOP) => Err(ApiError::BadRequest(format!("shop_id {GLOBAL_SHOP} is reserved"))),
            Some(shop_id) => Ok(shop_id),
            None => Ok(self.default_shop_id),
        }
    }
}
