use super::LocaleProvider;
use crate::settings::ShopId;

/// Language and currency fixed at startup, identical for every shop.
#[derive(Debug, Clone)]
pub struct StaticLocale {
    pub language_iso_code: String,
    pub currency_iso_code: String,
}

impl StaticLocale {
    pub fn from_config(cfg: &configs::ShopConfig) -> Self {
        Self {
            language_iso_code: cfg.language_iso_code.to_lowercase(),
            currency_iso_code: cfg.currency_iso_code.to_uppercase(),
        }
    }
}

impl LocaleProvider for StaticLocale {
    fn language_iso_code(&self) -> String {
        self.language_iso_code.clone()
    }

    fn currency_iso_code(&self, _shop_id: ShopId) -> String {
        self.currency_iso_code.clone()
    }
}
