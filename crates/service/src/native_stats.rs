//! Native dashboard modules handling.
//!
//! Once a shop has completed onboarding, the host's built-in dashboard
//! widgets are switched off in favour of the metrics dashboard. Every module
//! disabled that way is remembered in the modules-toggled list so `restore`
//! can switch it back on.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::settings::{ConfigurationRepository, ConfigurationStore, ShopId};

pub const NATIVE_DASHBOARD_MODULES: [&str; 4] = ["dashactivity", "dashtrends", "dashgoals", "dashproducts"];

/// Host module enable/disable switch.
#[async_trait]
pub trait ModuleManager: Send + Sync {
    async fn is_enabled(&self, name: &str, shop_id: ShopId) -> Result<bool, ServiceError>;
    /// Returns whether the host accepted the change.
    async fn set_enabled(&self, name: &str, enabled: bool, shop_id: ShopId) -> Result<bool, ServiceError>;
}

/// Module states kept in the configuration store under
/// `PS_MODULE_ENABLED_<NAME>`; a module never touched counts as enabled.
pub struct StoreBackedModules {
    store: Arc<dyn ConfigurationStore>,
}

impl StoreBackedModules {
    pub fn new(store: Arc<dyn ConfigurationStore>) -> Self { Self { store } }

    pub fn key(name: &str) -> String {
        format!("PS_MODULE_ENABLED_{}", name.to_uppercase())
    }
}

#[async_trait]
impl ModuleManager for StoreBackedModules {
    async fn is_enabled(&self, name: &str, shop_id: ShopId) -> Result<bool, ServiceError> {
        Ok(self.store.get(&Self::key(name), shop_id).await?.as_deref() != Some("0"))
    }

    async fn set_enabled(&self, name: &str, enabled: bool, shop_id: ShopId) -> Result<bool, ServiceError> {
        let value = if enabled { "1" } else { "0" };
        self.store.update_value(&Self::key(name), value.to_string(), shop_id).await
    }
}

pub struct NativeStatsHandler {
    settings: Arc<ConfigurationRepository>,
    modules: Arc<dyn ModuleManager>,
}

impl NativeStatsHandler {
    pub fn new(settings: Arc<ConfigurationRepository>, modules: Arc<dyn ModuleManager>) -> Self {
        Self { settings, modules }
    }

    /// Disable the native dashboard modules of an onboarded shop.
    /// Returns the modules disabled by this call.
    #[instrument(skip(self))]
    pub async fn install_if_onboarded(&self, shop_id: ShopId) -> Result<Vec<String>, ServiceError> {
        if !self.settings.get_first_time_onboarded(shop_id).await? {
            return Ok(Vec::new());
        }

        let mut toggled = self.settings.get_dashboard_modules_toggled(shop_id).await?.into_vec();
        let mut disabled = Vec::new();
        for name in NATIVE_DASHBOARD_MODULES {
            if !self.modules.is_enabled(name, shop_id).await? {
                continue;
            }
            if !self.modules.set_enabled(name, false, shop_id).await? {
                warn!(module = name, shop_id, "host refused to disable native module");
                continue;
            }
            disabled.push(name.to_string());
            if !toggled.iter().any(|m| m == name) {
                toggled.push(name.to_string());
            }
        }

        if !disabled.is_empty() {
            self.settings.set_dashboard_modules_toggled(shop_id, &toggled).await?;
            info!(shop_id, ?disabled, "native dashboard modules disabled");
        }
        Ok(disabled)
    }

    /// Re-enable every module recorded as toggled and clear the list.
    #[instrument(skip(self))]
    pub async fn restore(&self, shop_id: ShopId) -> Result<Vec<String>, ServiceError> {
        let toggled = self.settings.get_dashboard_modules_toggled(shop_id).await?;
        if toggled.is_unset() {
            return Ok(Vec::new());
        }

        let mut restored = Vec::new();
        for name in toggled.as_slice() {
            if self.modules.set_enabled(name, true, shop_id).await? {
                restored.push(name.clone());
            } else {
                warn!(module = %name, shop_id, "host refused to re-enable module");
            }
        }
        // modules the host refused stay recorded for the next attempt
        let remaining: Vec<String> = toggled.into_vec().into_iter().filter(|m| !restored.contains(m)).collect();
        self.settings.set_dashboard_modules_toggled(shop_id, &remaining).await?;
        info!(shop_id, ?restored, "native dashboard modules restored");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::store::mock::InMemoryConfigurationStore;
    use crate::settings::ToggledModules;

    fn handler() -> (Arc<InMemoryConfigurationStore>, Arc<ConfigurationRepository>, NativeStatsHandler) {
        let store = Arc::new(InMemoryConfigurationStore::default());
        let settings = Arc::new(ConfigurationRepository::new(store.clone()));
        let modules = Arc::new(StoreBackedModules::new(store.clone()));
        (store, settings.clone(), NativeStatsHandler::new(settings, modules))
    }

    #[tokio::test]
    async fn does_nothing_before_onboarding() -> Result<(), ServiceError> {
        let (store, settings, handler) = handler();
        assert!(handler.install_if_onboarded(1).await?.is_empty());
        assert!(settings.get_dashboard_modules_toggled(1).await?.is_unset());
        assert_eq!(store.raw(&StoreBackedModules::key("dashgoals"), 1), None);
        Ok(())
    }

    #[tokio::test]
    async fn disables_enabled_modules_and_records_them() -> Result<(), ServiceError> {
        let (store, settings, handler) = handler();
        settings.set_first_time_onboarded(1, true).await?;
        store.put_raw(&StoreBackedModules::key("dashtrends"), "0", 1);

        let disabled = handler.install_if_onboarded(1).await?;
        assert_eq!(disabled, vec!["dashactivity", "dashgoals", "dashproducts"]);
        assert_eq!(
            settings.get_dashboard_modules_toggled(1).await?,
            ToggledModules::Modules(disabled.clone())
        );

        // second pass finds nothing left to disable and keeps the list
        assert!(handler.install_if_onboarded(1).await?.is_empty());
        assert_eq!(settings.get_dashboard_modules_toggled(1).await?.as_slice().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn restore_reenables_and_clears() -> Result<(), ServiceError> {
        let (store, settings, handler) = handler();
        settings.set_first_time_onboarded(2, true).await?;
        handler.install_if_onboarded(2).await?;

        let restored = handler.restore(2).await?;
        assert_eq!(restored.len(), 4);
        assert_eq!(store.raw(&StoreBackedModules::key("dashactivity"), 2).as_deref(), Some("1"));
        assert!(settings.get_dashboard_modules_toggled(2).await?.is_unset());

        // nothing recorded, nothing to do
        assert!(handler.restore(2).await?.is_empty());
        Ok(())
    }
}
