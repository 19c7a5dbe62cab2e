//! Per-shop settings: the key/value store seam, its file-backed
//! implementation and the typed repository on top.

pub mod store;
pub mod file;
pub mod repository;

pub use repository::{ConfigurationRepository, SettingsRecord, ToggledModules};
pub use store::{ConfigurationStore, ShopId, GLOBAL_SHOP};
