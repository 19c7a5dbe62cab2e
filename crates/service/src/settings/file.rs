use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::{debug, info};

use super::store::{ConfigurationStore, ShopId};
use crate::errors::ServiceError;

type ShopEntries = BTreeMap<ShopId, BTreeMap<String, String>>;

/// JSON file-backed configuration store.
///
/// Keeps `shop_id -> (name -> value)` in memory and rewrites the whole file
/// after every accepted write. Layout: `{"1": {"PS_METRICS_ACCOUNT_LINKED": "1"}}`.
#[derive(Clone)]
pub struct JsonConfigurationStore {
    inner: Arc<RwLock<ShopEntries>>,
    file_path: PathBuf,
}

impl JsonConfigurationStore {
    /// Load the store from `path`, creating an empty file when missing.
    /// An unreadable or corrupt file is reported instead of being replaced.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::store)?;
        }

        let entries: ShopEntries = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => ShopEntries::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::StoreUnavailable(format!("{}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = ShopEntries::new();
                write_entries(&file_path, &empty).await?;
                info!(path = %file_path.display(), "created empty configuration store");
                empty
            }
            Err(e) => return Err(ServiceError::store(e)),
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(entries)), file_path }))
    }

    /// Number of shops with at least one stored entry.
    pub async fn shop_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

async fn write_entries(path: &PathBuf, entries: &ShopEntries) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(entries).map_err(ServiceError::store)?;
    fs::write(path, data).await.map_err(ServiceError::store)
}

#[async_trait]
impl ConfigurationStore for JsonConfigurationStore {
    async fn get(&self, name: &str, shop_id: ShopId) -> Result<Option<String>, ServiceError> {
        let entries = self.inner.read().await;
        Ok(entries.get(&shop_id).and_then(|shop| shop.get(name)).cloned())
    }

    async fn update_value(&self, name: &str, value: String, shop_id: ShopId) -> Result<bool, ServiceError> {
        // the write lock is held across the file write so the file never lags
        // behind a later in-memory update
        let mut entries = self.inner.write().await;
        let previous = entries.entry(shop_id).or_default().insert(name.to_string(), value);
        if let Err(e) = write_entries(&self.file_path, &entries).await {
            let shop = entries.entry(shop_id).or_default();
            match previous {
                Some(old) => { shop.insert(name.to_string(), old); }
                None => { shop.remove(name); }
            }
            return Err(e);
        }
        debug!(%name, shop_id, "configuration value written");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("metrics_configuration_{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_store_persists_per_shop() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = JsonConfigurationStore::new(&tmp).await?;

        assert_eq!(store.get("PS_METRICS_ACCOUNT_LINKED", 1).await?, None);
        assert!(store.update_value("PS_METRICS_ACCOUNT_LINKED", "1".into(), 1).await?);
        assert!(store.update_value("PS_METRICS_ACCOUNT_LINKED", "0".into(), 2).await?);
        assert_eq!(store.shop_count().await, 2);

        // overwrite
        assert!(store.update_value("PS_METRICS_ACCOUNT_LINKED", "0".into(), 1).await?);

        // reload from disk
        let reloaded = JsonConfigurationStore::new(&tmp).await?;
        assert_eq!(reloaded.get("PS_METRICS_ACCOUNT_LINKED", 1).await?.as_deref(), Some("0"));
        assert_eq!(reloaded.get("PS_METRICS_ACCOUNT_LINKED", 2).await?.as_deref(), Some("0"));
        assert_eq!(reloaded.get("PS_METRICS_ACCOUNT_LINKED", 3).await?, None);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        tokio::fs::write(&tmp, b"{not json").await?;

        let err = JsonConfigurationStore::new(&tmp).await.err().expect("corrupt file must fail");
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));

        // file left untouched
        assert_eq!(tokio::fs::read(&tmp).await?, b"{not json");
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
