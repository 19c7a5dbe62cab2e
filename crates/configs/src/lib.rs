use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Where the metrics module is installed and what it reports about itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    #[serde(default = "default_module_name")]
    pub name: String,
    #[serde(default = "default_module_version")]
    pub version: String,
    /// Public URI prefix of the module, with trailing slash.
    #[serde(default = "default_path_uri")]
    pub path_uri: String,
    /// Filesystem directory holding installed modules.
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,
    #[serde(default = "default_eventbus_version")]
    pub eventbus_version: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: default_module_name(),
            version: default_module_version(),
            path_uri: default_path_uri(),
            modules_dir: default_modules_dir(),
            eventbus_version: default_eventbus_version(),
        }
    }
}

fn default_module_name() -> String { "ps_metrics".into() }
fn default_module_version() -> String { "2.3.2".into() }
fn default_path_uri() -> String { "/modules/ps_metrics/".into() }
fn default_modules_dir() -> String { "modules".into() }
fn default_eventbus_version() -> String { "1.3.7".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Serve the dashboard bundle from the module directory instead of the CDN.
    #[serde(default)]
    pub use_local_vue_app: bool,
    #[serde(default = "default_cdn_url")]
    pub cdn_url: String,
    #[serde(default = "default_layout_title")]
    pub layout_title: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { use_local_vue_app: false, cdn_url: default_cdn_url(), layout_title: default_layout_title() }
    }
}

fn default_cdn_url() -> String { "https://assets.prestashop3.com/ext/ps_metrics/".into() }
fn default_layout_title() -> String { "PrestaShop Metrics".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    #[serde(default = "default_shop_id")]
    pub default_shop_id: u32,
    #[serde(default = "default_language_iso")]
    pub language_iso_code: String,
    #[serde(default = "default_currency_iso")]
    pub currency_iso_code: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            default_shop_id: default_shop_id(),
            language_iso_code: default_language_iso(),
            currency_iso_code: default_currency_iso(),
        }
    }
}

fn default_shop_id() -> u32 { 1 }
fn default_language_iso() -> String { "en".into() }
fn default_currency_iso() -> String { "EUR".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { settings_path: default_settings_path() }
    }
}

fn default_settings_path() -> String { "data/configuration.json".into() }

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.module.normalize();
        self.metrics.normalize_from_env();
        self.metrics.validate()?;
        if self.shop.default_shop_id == 0 {
            return Err(anyhow!("shop.default_shop_id must be >= 1"));
        }
        if self.storage.settings_path.trim().is_empty() {
            return Err(anyhow!("storage.settings_path must not be empty"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl ModuleConfig {
    fn normalize(&mut self) {
        if !self.path_uri.ends_with('/') {
            self.path_uri.push('/');
        }
    }
}

impl MetricsConfig {
    pub fn normalize_from_env(&mut self) {
        // env wins so a developer can flip to the local bundle without editing config.toml
        if let Ok(v) = std::env::var("PS_METRICS_USE_LOCAL_VUE_APP") {
            self.use_local_vue_app = matches!(v.trim(), "1" | "true" | "yes");
        }
        if !self.cdn_url.ends_with('/') {
            self.cdn_url.push('/');
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.cdn_url.to_lowercase();
        if !(lower.starts_with("https://") || lower.starts_with("http://")) {
            return Err(anyhow!("metrics.cdn_url must start with http:// or https://"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.module.name, "ps_metrics");
        assert_eq!(cfg.shop.default_shop_id, 1);
        assert!(!cfg.metrics.use_local_vue_app);
    }

    #[test]
    fn normalize_adds_trailing_slashes() {
        let mut cfg = load_from_str(
            r#"
            [module]
            path_uri = "/modules/ps_metrics"

            [metrics]
            cdn_url = "https://cdn.example.com/metrics"
            "#,
        )
        .unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.module.path_uri, "/modules/ps_metrics/");
        assert_eq!(cfg.metrics.cdn_url, "https://cdn.example.com/metrics/");
    }

    #[test]
    fn rejects_non_http_cdn() {
        let mut cfg = load_from_str("[metrics]\ncdn_url = \"ftp://cdn\"\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_zero_shop_id() {
        let mut cfg = load_from_str("[shop]\ndefault_shop_id = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }
}
