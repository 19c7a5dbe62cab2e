use async_trait::async_trait;

use crate::errors::ServiceError;

/// Identifier of one storefront in a multi-store installation.
pub type ShopId = u32;

/// Scope for host-wide entries that belong to no particular shop.
pub const GLOBAL_SHOP: ShopId = 0;

/// Host configuration key/value service.
/// Values are plain text; typed decoding is the caller's concern.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Raw value stored under `name` for `shop_id`, `None` when never written.
    async fn get(&self, name: &str, shop_id: ShopId) -> Result<Option<String>, ServiceError>;

    /// Create or overwrite the value; returns whether the store accepted the write.
    async fn update_value(&self, name: &str, value: String, shop_id: ShopId) -> Result<bool, ServiceError>;
}

/// Simple in-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryConfigurationStore {
        values: Mutex<HashMap<(ShopId, String), String>>, // key: (shop_id, name)
        read_only: AtomicBool,
        unavailable: AtomicBool,
    }

    impl InMemoryConfigurationStore {
        /// Reject every write with `Ok(false)` while set.
        pub fn set_read_only(&self, read_only: bool) {
            self.read_only.store(read_only, Ordering::SeqCst);
        }

        /// Fail every call with `StoreUnavailable` while set.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Seed a raw value, bypassing the read-only switch.
        pub fn put_raw(&self, name: &str, value: &str, shop_id: ShopId) {
            let mut values = self.values.lock().unwrap();
            values.insert((shop_id, name.to_string()), value.to_string());
        }

        pub fn raw(&self, name: &str, shop_id: ShopId) -> Option<String> {
            let values = self.values.lock().unwrap();
            values.get(&(shop_id, name.to_string())).cloned()
        }

        fn check_available(&self) -> Result<(), ServiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ServiceError::StoreUnavailable("in-memory store switched off".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ConfigurationStore for InMemoryConfigurationStore {
        async fn get(&self, name: &str, shop_id: ShopId) -> Result<Option<String>, ServiceError> {
            self.check_available()?;
            Ok(self.raw(name, shop_id))
        }

        async fn update_value(&self, name: &str, value: String, shop_id: ShopId) -> Result<bool, ServiceError> {
            self.check_available()?;
            if self.read_only.load(Ordering::SeqCst) {
                return Ok(false);
            }
            let mut values = self.values.lock().unwrap();
            values.insert((shop_id, name.to_string()), value);
            Ok(true)
        }
    }
}
