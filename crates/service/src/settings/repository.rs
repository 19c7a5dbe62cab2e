use std::sync::Arc;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument};

use super::store::{ConfigurationStore, ShopId};
use crate::errors::ServiceError;

pub const FIRST_TIME_ONBOARDED: &str = "PS_METRICS_FIRST_TIME_ONBOARDED";
pub const MODULES_STATES: &str = "PS_METRICS_MODULES_STATES";
pub const ACCOUNT_LINKED: &str = "PS_METRICS_ACCOUNT_LINKED";
pub const GOOGLETAG_LINKED: &str = "PS_METRICS_GOOGLETAG_LINKED";
pub const SHOP_DOMAIN: &str = "PS_SHOP_DOMAIN";

/// Stored list of module names waiting for an enable/disable action.
///
/// `Unset` is what reading back "never written" or "written empty" yields;
/// an empty write is stored as `""` rather than `"[]"` and existing data
/// relies on that, so it is not folded into `Modules(vec![])`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToggledModules {
    #[default]
    Unset,
    Modules(Vec<String>),
}

impl ToggledModules {
    pub fn is_unset(&self) -> bool {
        matches!(self, ToggledModules::Unset)
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            ToggledModules::Unset => &[],
            ToggledModules::Modules(m) => m,
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            ToggledModules::Unset => Vec::new(),
            ToggledModules::Modules(m) => m,
        }
    }
}

impl Serialize for ToggledModules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToggledModules::Unset => serializer.serialize_str(""),
            ToggledModules::Modules(m) => m.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ToggledModules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            List(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) if s.is_empty() => Ok(ToggledModules::Unset),
            Raw::Text(s) => Err(de::Error::invalid_value(de::Unexpected::Str(&s), &"an empty string or a list of module names")),
            Raw::List(m) => Ok(ToggledModules::Modules(m)),
        }
    }
}

/// All per-shop settings read in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub first_time_onboarded: bool,
    pub account_linked: bool,
    pub google_tag_linked: bool,
    pub dashboard_modules_toggled: ToggledModules,
    pub shop_domain: Option<String>,
}

/// Typed access to the metrics settings of each shop.
pub struct ConfigurationRepository {
    store: Arc<dyn ConfigurationStore>,
}

fn read_flag(raw: Option<String>) -> bool {
    match raw {
        Some(v) => {
            let v = v.trim();
            !v.is_empty() && v != "0"
        }
        None => false,
    }
}

fn flag_value(value: bool) -> String {
    if value { "1".into() } else { "0".into() }
}

impl ConfigurationRepository {
    pub fn new(store: Arc<dyn ConfigurationStore>) -> Self { Self { store } }

    async fn get_flag(&self, key: &str, shop_id: ShopId) -> Result<bool, ServiceError> {
        Ok(read_flag(self.store.get(key, shop_id).await?))
    }

    async fn set_flag(&self, key: &str, shop_id: ShopId, value: bool) -> Result<bool, ServiceError> {
        let accepted = self.store.update_value(key, flag_value(value), shop_id).await?;
        debug!(key, shop_id, value, accepted, "flag saved");
        Ok(accepted)
    }

    /// Whether the shop has completed onboarding at least once.
    pub async fn get_first_time_onboarded(&self, shop_id: ShopId) -> Result<bool, ServiceError> {
        self.get_flag(FIRST_TIME_ONBOARDED, shop_id).await
    }

    /// Record onboarding completion; returns whether the store accepted it.
    ///
    /// # Examples
    /// ```
    /// use service::settings::{store::mock::InMemoryConfigurationStore, ConfigurationRepository};
    /// use std::sync::Arc;
    /// let repo = ConfigurationRepository::new(Arc::new(InMemoryConfigurationStore::default()));
    /// assert!(tokio_test::block_on(repo.set_first_time_onboarded(1, true)).unwrap());
    /// assert!(tokio_test::block_on(repo.get_first_time_onboarded(1)).unwrap());
    /// ```
    #[instrument(skip(self))]
    pub async fn set_first_time_onboarded(&self, shop_id: ShopId, value: bool) -> Result<bool, ServiceError> {
        self.set_flag(FIRST_TIME_ONBOARDED, shop_id, value).await
    }

    pub async fn get_account_linked(&self, shop_id: ShopId) -> Result<bool, ServiceError> {
        self.get_flag(ACCOUNT_LINKED, shop_id).await
    }

    #[instrument(skip(self))]
    pub async fn set_account_linked(&self, shop_id: ShopId, value: bool) -> Result<bool, ServiceError> {
        self.set_flag(ACCOUNT_LINKED, shop_id, value).await
    }

    pub async fn get_google_tag_linked(&self, shop_id: ShopId) -> Result<bool, ServiceError> {
        self.get_flag(GOOGLETAG_LINKED, shop_id).await
    }

    #[instrument(skip(self))]
    pub async fn set_google_tag_linked(&self, shop_id: ShopId, value: bool) -> Result<bool, ServiceError> {
        self.set_flag(GOOGLETAG_LINKED, shop_id, value).await
    }

    /// Shop domain as configured by the host; never written from here.
    pub async fn get_shop_domain(&self, shop_id: ShopId) -> Result<Option<String>, ServiceError> {
        self.store.get(SHOP_DOMAIN, shop_id).await
    }

    /// Store the pending module list: `""` when empty, a JSON array otherwise.
    #[instrument(skip(self, modules), fields(count = modules.len()))]
    pub async fn set_dashboard_modules_toggled(&self, shop_id: ShopId, modules: &[String]) -> Result<bool, ServiceError> {
        let encoded = if modules.is_empty() {
            String::new()
        } else {
            serde_json::to_string(modules).map_err(|e| ServiceError::Validation(e.to_string()))?
        };
        self.store.update_value(MODULES_STATES, encoded, shop_id).await
    }

    pub async fn get_dashboard_modules_toggled(&self, shop_id: ShopId) -> Result<ToggledModules, ServiceError> {
        let raw = match self.store.get(MODULES_STATES, shop_id).await? {
            None => return Ok(ToggledModules::Unset),
            Some(raw) if raw.is_empty() => return Ok(ToggledModules::Unset),
            Some(raw) => raw,
        };
        let modules: Vec<String> = serde_json::from_str(&raw)
            .map_err(|source| ServiceError::MalformedValue { key: MODULES_STATES.to_string(), source })?;
        Ok(ToggledModules::Modules(modules))
    }

    /// Read every setting of `shop_id`. No consistency across the reads.
    pub async fn snapshot(&self, shop_id: ShopId) -> Result<SettingsRecord, ServiceError> {
        Ok(SettingsRecord {
            first_time_onboarded: self.get_first_time_onboarded(shop_id).await?,
            account_linked: self.get_account_linked(shop_id).await?,
            google_tag_linked: self.get_google_tag_linked(shop_id).await?,
            dashboard_modules_toggled: self.get_dashboard_modules_toggled(shop_id).await?,
            shop_domain: self.get_shop_domain(shop_id).await?,
        })
    }
}
