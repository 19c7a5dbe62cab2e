use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{AccountLookup, AccountProvider, Installer, LinkedAccount};
use crate::errors::ServiceError;
use crate::settings::{ConfigurationStore, ShopId, GLOBAL_SHOP};

pub const ACCOUNTS_INSTALLED: &str = "PS_ACCOUNTS_INSTALLED";
pub const SHOP_UUID: &str = "PSX_UUID_V4";

/// Account service whose state lives in the host configuration store:
/// an install marker (host-wide) and the linked shop uuid (per shop).
pub struct StoreBackedAccounts {
    store: Arc<dyn ConfigurationStore>,
}

impl StoreBackedAccounts {
    pub fn new(store: Arc<dyn ConfigurationStore>) -> Self { Self { store } }

    async fn installed(&self) -> Result<bool, ServiceError> {
        Ok(self.store.get(ACCOUNTS_INSTALLED, GLOBAL_SHOP).await?.as_deref() == Some("1"))
    }
}

#[async_trait]
impl AccountProvider for StoreBackedAccounts {
    async fn lookup(&self, shop_id: ShopId) -> AccountLookup {
        match self.installed().await {
            Ok(true) => {}
            Ok(false) => return AccountLookup::NotFound,
            Err(e) => return AccountLookup::Error(e.to_string()),
        }
        let shop_uuid = match self.store.get(SHOP_UUID, shop_id).await {
            Ok(uuid) => uuid.filter(|u| !u.trim().is_empty()),
            Err(e) => return AccountLookup::Error(e.to_string()),
        };
        AccountLookup::Found(LinkedAccount {
            context: json!({
                "shopId": shop_id,
                "shopUuid": shop_uuid,
                "isShopLinked": shop_uuid.is_some(),
            }),
            shop_uuid,
        })
    }
}

#[async_trait]
impl Installer for StoreBackedAccounts {
    async fn install(&self) -> Result<(), ServiceError> {
        if self.installed().await? {
            debug!("account service already installed");
            return Ok(());
        }
        if !self.store.update_value(ACCOUNTS_INSTALLED, "1".into(), GLOBAL_SHOP).await? {
            warn!("configuration store rejected account service install marker");
            return Err(ServiceError::Install("install marker not accepted".into()));
        }
        info!("account service installed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::store::mock::InMemoryConfigurationStore;

    #[tokio::test]
    async fn not_installed_is_not_found() {
        let store = Arc::new(InMemoryConfigurationStore::default());
        let accounts = StoreBackedAccounts::new(store);
        assert_eq!(accounts.lookup(1).await, AccountLookup::NotFound);
    }

    #[tokio::test]
    async fn install_is_idempotent_and_enables_lookup() -> Result<(), ServiceError> {
        let store = Arc::new(InMemoryConfigurationStore::default());
        let accounts = StoreBackedAccounts::new(store.clone());
        accounts.install().await?;
        accounts.install().await?;
        assert_eq!(store.raw(ACCOUNTS_INSTALLED, GLOBAL_SHOP).as_deref(), Some("1"));

        let found = accounts.lookup(1).await;
        let account = found.account().expect("installed service is found");
        assert_eq!(account.shop_uuid, None);

        store.put_raw(SHOP_UUID, "8f6c5a52-4a57-4ab8-bb9a-5f6ac8e0c1c2", 1);
        let account = accounts.lookup(1).await.account().cloned().unwrap();
        assert_eq!(account.shop_uuid.as_deref(), Some("8f6c5a52-4a57-4ab8-bb9a-5f6ac8e0c1c2"));
        assert_eq!(account.context["isShopLinked"], true);
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_becomes_lookup_error() {
        let store = Arc::new(InMemoryConfigurationStore::default());
        store.set_unavailable(true);
        let accounts = StoreBackedAccounts::new(store);
        assert!(matches!(accounts.lookup(1).await, AccountLookup::Error(_)));
    }

    #[tokio::test]
    async fn rejected_install_is_an_error() {
        let store = Arc::new(InMemoryConfigurationStore::default());
        store.set_read_only(true);
        let accounts = StoreBackedAccounts::new(store);
        assert!(matches!(accounts.install().await, Err(ServiceError::Install(_))));
    }
}
