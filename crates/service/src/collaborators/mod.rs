//! Host services the dashboard depends on, injected as typed trait objects.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;
use crate::settings::ShopId;

pub mod accounts;
pub mod assets;
pub mod links;
pub mod locale;
pub mod render;

/// Account service as seen by one shop.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedAccount {
    /// Identifier assigned once the shop is linked; `None` until then.
    pub shop_uuid: Option<String>,
    /// Opaque context handed to the front-end account widget.
    pub context: Value,
}

/// Outcome of looking up the account service.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountLookup {
    Found(LinkedAccount),
    NotFound,
    Error(String),
}

impl AccountLookup {
    pub fn account(&self) -> Option<&LinkedAccount> {
        match self {
            AccountLookup::Found(account) => Some(account),
            _ => None,
        }
    }
}

#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn lookup(&self, shop_id: ShopId) -> AccountLookup;
}

/// Installs the account service. Must be idempotent.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self) -> Result<(), ServiceError>;
}

/// Admin URL generation by route name.
pub trait LinkGenerator: Send + Sync {
    fn admin_link(&self, route: &str, token: Option<&str>, params: &[(&str, String)]) -> String;
    fn link_without_token(&self, route: &str) -> String;
}

pub trait LocaleProvider: Send + Sync {
    fn language_iso_code(&self) -> String;
    fn currency_iso_code(&self, shop_id: ShopId) -> String;
}

/// Renders a named template with a JSON object of parameters.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, params: &Value) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait AssetProbe: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
}

/// Fakes for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns the same lookup result for every shop.
    pub struct FixedAccounts(pub AccountLookup);

    #[async_trait]
    impl AccountProvider for FixedAccounts {
        async fn lookup(&self, _shop_id: ShopId) -> AccountLookup {
            self.0.clone()
        }
    }

    #[derive(Default)]
    pub struct CountingInstaller {
        calls: AtomicUsize,
        pub fail: bool,
    }

    impl CountingInstaller {
        pub fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), fail: true }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Installer for CountingInstaller {
        async fn install(&self) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ServiceError::Install("installer unreachable".into()));
            }
            Ok(())
        }
    }

    pub struct FixedProbe(pub bool);

    #[async_trait]
    impl AssetProbe for FixedProbe {
        async fn exists(&self, _path: &Path) -> bool {
            self.0
        }
    }

    /// Records the last render call and echoes the template name.
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub last: Mutex<Option<(String, Value)>>,
        pub fail: bool,
    }

    impl TemplateRenderer for RecordingRenderer {
        fn render(&self, template: &str, params: &Value) -> Result<String, ServiceError> {
            if self.fail {
                return Err(ServiceError::Render(format!("template {template} missing")));
            }
            *self.last.lock().unwrap() = Some((template.to_string(), params.clone()));
            Ok(format!("rendered:{template}"))
        }
    }
}
