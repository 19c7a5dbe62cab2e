//! Composition of the metrics dashboard page.
//!
//! One call per admin request: settle the account service, decide whether
//! the first-run redirect applies, resolve the front-end bundle location and
//! hand a flat parameter set to the template renderer.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::collaborators::links::{METRICS_API_RESOLVER, METRICS_GRAPHQL, METRICS_PAGE};
use crate::collaborators::{
    AccountLookup, AccountProvider, AssetProbe, Installer, LinkGenerator, LocaleProvider, TemplateRenderer,
};
use crate::errors::ServiceError;
use crate::native_stats::NativeStatsHandler;
use crate::settings::ShopId;

pub const SETTINGS_FRAGMENT: &str = "#/settings";
const APP_BUNDLE: &str = "js/metrics.umd.js";
const APP_SOURCE_MAP: &str = "js/metrics.umd.js.map";
const APP_STYLESHEET: &str = "css/style.css";
const LOCAL_DIST: &str = "_dev/dist/";

/// Static facts about the installed module and where its bundle lives.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub use_local_vue_app: bool,
    pub cdn_url: String,
    pub module_name: String,
    pub module_version: String,
    pub module_path_uri: String,
    pub modules_dir: PathBuf,
    pub eventbus_version: String,
    pub layout_title: String,
}

impl DashboardConfig {
    pub fn from_app_config(cfg: &configs::AppConfig) -> Self {
        Self {
            use_local_vue_app: cfg.metrics.use_local_vue_app,
            cdn_url: cfg.metrics.cdn_url.clone(),
            module_name: cfg.module.name.clone(),
            module_version: cfg.module.version.clone(),
            module_path_uri: cfg.module.path_uri.clone(),
            modules_dir: PathBuf::from(&cfg.module.modules_dir),
            eventbus_version: cfg.module.eventbus_version.clone(),
            layout_title: cfg.metrics.layout_title.clone(),
        }
    }

    pub fn template(&self) -> String {
        format!("@Modules/{}/views/templates/admin/metrics.html.twig", self.module_name)
    }

    /// On-disk location of the locally built source map.
    pub fn source_map_file(&self) -> PathBuf {
        self.modules_dir.join(&self.module_name).join(LOCAL_DIST).join(APP_SOURCE_MAP)
    }

    fn asset_url(&self, relative: &str) -> String {
        if self.use_local_vue_app {
            format!("{}{}{}", self.module_path_uri, LOCAL_DIST, relative)
        } else {
            format!("{}{}", self.cdn_url, relative)
        }
    }

    /// Bundle, stylesheet and (when present on disk) source map URLs.
    pub fn resolve_assets(&self, source_map_present: bool) -> AssetPaths {
        AssetPaths {
            app: self.asset_url(APP_BUNDLE),
            stylesheet: self.asset_url(APP_STYLESHEET),
            source_map: source_map_present.then(|| self.asset_url(APP_SOURCE_MAP)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub app: String,
    pub stylesheet: String,
    pub source_map: Option<String>,
}

/// Request-scoped inputs, straight from the admin query string.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub shop_id: ShopId,
    pub settings_redirect: Option<String>,
    pub fullscreen: Option<String>,
    pub admin_token: Option<String>,
    pub google_message_error: Option<String>,
    pub redirect: Option<String>,
}

impl DashboardRequest {
    pub fn new(shop_id: ShopId) -> Self {
        Self { shop_id, ..Default::default() }
    }

    fn already_redirected(&self) -> bool {
        self.settings_redirect.as_deref().map(str::trim) == Some("1")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub layout_title: String,
    pub show_content_header: bool,
    pub path_metrics_app: String,
    pub path_metrics_app_source_map: Option<String>,
    pub path_metrics_assets: String,
    pub context_ps_accounts: Value,
    pub metrics_api_url: String,
    pub admin_token: Option<String>,
    pub o_auth_google_error_message: Option<String>,
    pub fullscreen: bool,
    pub metrics_module_version: String,
    pub event_bus_module_version: String,
    pub graphql_endpoint: String,
    pub iso_code: String,
    pub currency_iso_code: String,
    pub current_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardOutcome {
    /// Send the browser to this URL instead of rendering.
    Redirect(String),
    Render { html: String, params: DashboardParams },
}

/// Everything the dashboard talks to.
#[derive(Clone)]
pub struct DashboardCollaborators {
    pub accounts: Arc<dyn AccountProvider>,
    pub installer: Arc<dyn Installer>,
    pub native_stats: Arc<NativeStatsHandler>,
    pub links: Arc<dyn LinkGenerator>,
    pub locale: Arc<dyn LocaleProvider>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub probe: Arc<dyn AssetProbe>,
}

pub struct DashboardService {
    deps: DashboardCollaborators,
    cfg: DashboardConfig,
}

impl DashboardService {
    pub fn new(deps: DashboardCollaborators, cfg: DashboardConfig) -> Self { Self { deps, cfg } }

    #[instrument(skip(self, req), fields(shop_id = req.shop_id))]
    pub async fn compose(&self, req: &DashboardRequest) -> Result<DashboardOutcome, ServiceError> {
        let lookup = self.deps.accounts.lookup(req.shop_id).await;
        if let AccountLookup::Error(reason) = &lookup {
            warn!(%reason, "account service lookup failed; treating as absent");
        }

        let account = match lookup.account() {
            Some(account) => account,
            None => {
                // installer outcome is not inspected; the next request looks again
                if let Err(e) = self.deps.installer.install().await {
                    warn!(error = %e, "account service install failed");
                }
                debug!("account service absent, install requested");
                return self.render(req, Value::Object(Default::default())).await;
            }
        };

        if account.shop_uuid.is_none() && !req.already_redirected() {
            let url = self.deps.links.admin_link(
                METRICS_PAGE,
                req.admin_token.as_deref(),
                &[("settings_redirect", "1".to_string())],
            ) + SETTINGS_FRAGMENT;
            info!(%url, "shop not linked yet, redirecting to settings");
            return Ok(DashboardOutcome::Redirect(url));
        }

        let context = account.context.clone();
        self.render(req, context).await
    }

    async fn render(&self, req: &DashboardRequest, accounts_context: Value) -> Result<DashboardOutcome, ServiceError> {
        self.deps.native_stats.install_if_onboarded(req.shop_id).await?;

        let source_map_present = self.deps.probe.exists(&self.cfg.source_map_file()).await;
        let assets = self.cfg.resolve_assets(source_map_present);
        debug!(local = self.cfg.use_local_vue_app, app = %assets.app, source_map = source_map_present, "assets resolved");

        let params = DashboardParams {
            layout_title: self.cfg.layout_title.clone(),
            show_content_header: false,
            path_metrics_app: assets.app,
            path_metrics_app_source_map: assets.source_map,
            path_metrics_assets: assets.stylesheet,
            context_ps_accounts: accounts_context,
            metrics_api_url: self.deps.links.link_without_token(METRICS_API_RESOLVER),
            admin_token: req.admin_token.clone(),
            o_auth_google_error_message: req.google_message_error.clone(),
            fullscreen: req.fullscreen.as_deref() == Some("true"),
            metrics_module_version: self.cfg.module_version.clone(),
            event_bus_module_version: self.cfg.eventbus_version.clone(),
            graphql_endpoint: self.deps.links.admin_link(METRICS_GRAPHQL, req.admin_token.as_deref(), &[]),
            iso_code: self.deps.locale.language_iso_code(),
            currency_iso_code: self.deps.locale.currency_iso_code(req.shop_id),
            current_page: req.redirect.clone(),
        };

        let value = serde_json::to_value(&params).map_err(|e| ServiceError::Render(e.to_string()))?;
        let html = self.deps.renderer.render(&self.cfg.template(), &value)?;
        Ok(DashboardOutcome::Render { html, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::links::RouteTableLinks;
    use crate::collaborators::locale::StaticLocale;
    use crate::collaborators::mock::{CountingInstaller, FixedAccounts, FixedProbe, RecordingRenderer};
    use crate::collaborators::LinkedAccount;
    use crate::native_stats::StoreBackedModules;
    use crate::settings::store::mock::InMemoryConfigurationStore;
    use crate::settings::ConfigurationRepository;
    use serde_json::json;

    struct Fixture {
        installer: Arc<CountingInstaller>,
        renderer: Arc<RecordingRenderer>,
        settings: Arc<ConfigurationRepository>,
        service: DashboardService,
    }

    fn config(local: bool) -> DashboardConfig {
        DashboardConfig {
            use_local_vue_app: local,
            cdn_url: "https://cdn.example.com/ps_metrics/".into(),
            module_name: "ps_metrics".into(),
            module_version: "2.3.2".into(),
            module_path_uri: "/modules/ps_metrics/".into(),
            modules_dir: PathBuf::from("/srv/shop/modules"),
            eventbus_version: "1.3.7".into(),
            layout_title: "PrestaShop Metrics".into(),
        }
    }

    fn fixture(lookup: AccountLookup, installer: CountingInstaller, source_map: bool, local: bool) -> Fixture {
        let store = Arc::new(InMemoryConfigurationStore::default());
        let settings = Arc::new(ConfigurationRepository::new(store.clone()));
        let installer = Arc::new(installer);
        let renderer = Arc::new(RecordingRenderer::default());
        let deps = DashboardCollaborators {
            accounts: Arc::new(FixedAccounts(lookup)),
            installer: installer.clone(),
            native_stats: Arc::new(NativeStatsHandler::new(settings.clone(), Arc::new(StoreBackedModules::new(store)))),
            links: Arc::new(RouteTableLinks::default()),
            locale: Arc::new(StaticLocale { language_iso_code: "fr".into(), currency_iso_code: "EUR".into() }),
            renderer: renderer.clone(),
            probe: Arc::new(FixedProbe(source_map)),
        };
        Fixture { installer, renderer, settings, service: DashboardService::new(deps, config(local)) }
    }

    fn unlinked() -> AccountLookup {
        AccountLookup::Found(LinkedAccount { shop_uuid: None, context: json!({"isShopLinked": false}) })
    }

    fn linked() -> AccountLookup {
        AccountLookup::Found(LinkedAccount { shop_uuid: Some("uuid-1".into()), context: json!({"isShopLinked": true}) })
    }

    fn rendered(outcome: DashboardOutcome) -> DashboardParams {
        match outcome {
            DashboardOutcome::Render { params, .. } => params,
            DashboardOutcome::Redirect(url) => panic!("unexpected redirect to {url}"),
        }
    }

    #[tokio::test]
    async fn lookup_error_installs_once_and_renders() -> Result<(), ServiceError> {
        let fx = fixture(AccountLookup::Error("installer exception".into()), CountingInstaller::default(), false, false);
        let params = rendered(fx.service.compose(&DashboardRequest::new(1)).await?);
        assert_eq!(fx.installer.calls(), 1);
        assert_eq!(params.context_ps_accounts, json!({}));
        Ok(())
    }

    #[tokio::test]
    async fn missing_service_installs_and_ignores_install_failure() -> Result<(), ServiceError> {
        let fx = fixture(AccountLookup::NotFound, CountingInstaller::failing(), false, false);
        let outcome = fx.service.compose(&DashboardRequest::new(1)).await?;
        assert!(matches!(outcome, DashboardOutcome::Render { .. }));
        assert_eq!(fx.installer.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unlinked_shop_redirects_to_settings() -> Result<(), ServiceError> {
        let fx = fixture(unlinked(), CountingInstaller::default(), false, false);
        let req = DashboardRequest { admin_token: Some("tok".into()), ..DashboardRequest::new(1) };
        match fx.service.compose(&req).await? {
            DashboardOutcome::Redirect(url) => {
                assert!(url.contains("settings_redirect=1"));
                assert!(url.ends_with("#/settings"));
                assert_eq!(url, "/admin/metrics?settings_redirect=1&_token=tok#/settings");
            }
            other => panic!("expected redirect, got {other:?}"),
        }
        assert_eq!(fx.installer.calls(), 0);
        assert!(fx.renderer.last.lock().unwrap().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn redirect_guard_stops_the_loop() -> Result<(), ServiceError> {
        let fx = fixture(unlinked(), CountingInstaller::default(), false, false);
        let req = DashboardRequest { settings_redirect: Some("1".into()), ..DashboardRequest::new(1) };
        let params = rendered(fx.service.compose(&req).await?);
        assert_eq!(params.context_ps_accounts["isShopLinked"], false);
        Ok(())
    }

    #[tokio::test]
    async fn linked_shop_renders_without_redirect() -> Result<(), ServiceError> {
        let fx = fixture(linked(), CountingInstaller::default(), false, false);
        let req = DashboardRequest {
            fullscreen: Some("true".into()),
            admin_token: Some("tok".into()),
            google_message_error: Some("denied".into()),
            redirect: Some("traffic".into()),
            ..DashboardRequest::new(1)
        };
        let params = rendered(fx.service.compose(&req).await?);
        assert!(params.fullscreen);
        assert!(!params.show_content_header);
        assert_eq!(params.admin_token.as_deref(), Some("tok"));
        assert_eq!(params.o_auth_google_error_message.as_deref(), Some("denied"));
        assert_eq!(params.current_page.as_deref(), Some("traffic"));
        assert_eq!(params.metrics_api_url, "/admin/metrics/api");
        assert_eq!(params.graphql_endpoint, "/admin/metrics/graphql?_token=tok");
        assert_eq!(params.iso_code, "fr");
        assert_eq!(params.currency_iso_code, "EUR");
        assert_eq!(params.event_bus_module_version, "1.3.7");

        let (template, value) = fx.renderer.last.lock().unwrap().clone().unwrap();
        assert_eq!(template, "@Modules/ps_metrics/views/templates/admin/metrics.html.twig");
        assert_eq!(value["layoutTitle"], "PrestaShop Metrics");
        assert_eq!(value["metricsModuleVersion"], "2.3.2");
        Ok(())
    }

    #[tokio::test]
    async fn fullscreen_needs_literal_true() -> Result<(), ServiceError> {
        let fx = fixture(linked(), CountingInstaller::default(), false, false);
        let req = DashboardRequest { fullscreen: Some("1".into()), ..DashboardRequest::new(1) };
        assert!(!rendered(fx.service.compose(&req).await?).fullscreen);
        Ok(())
    }

    #[tokio::test]
    async fn cdn_assets_by_default() -> Result<(), ServiceError> {
        let fx = fixture(linked(), CountingInstaller::default(), false, false);
        let params = rendered(fx.service.compose(&DashboardRequest::new(1)).await?);
        assert_eq!(params.path_metrics_app, "https://cdn.example.com/ps_metrics/js/metrics.umd.js");
        assert_eq!(params.path_metrics_assets, "https://cdn.example.com/ps_metrics/css/style.css");
        assert_eq!(params.path_metrics_app_source_map, None);
        Ok(())
    }

    #[tokio::test]
    async fn local_assets_with_source_map() -> Result<(), ServiceError> {
        let fx = fixture(linked(), CountingInstaller::default(), true, true);
        let params = rendered(fx.service.compose(&DashboardRequest::new(1)).await?);
        assert_eq!(params.path_metrics_app, "/modules/ps_metrics/_dev/dist/js/metrics.umd.js");
        assert_eq!(params.path_metrics_assets, "/modules/ps_metrics/_dev/dist/css/style.css");
        assert_eq!(
            params.path_metrics_app_source_map.as_deref(),
            Some("/modules/ps_metrics/_dev/dist/js/metrics.umd.js.map")
        );
        Ok(())
    }

    #[test]
    fn source_map_probe_path() {
        assert_eq!(
            config(false).source_map_file(),
            PathBuf::from("/srv/shop/modules/ps_metrics/_dev/dist/js/metrics.umd.js.map")
        );
        let cdn = config(false).resolve_assets(true);
        assert_eq!(cdn.source_map.as_deref(), Some("https://cdn.example.com/ps_metrics/js/metrics.umd.js.map"));
    }

    #[tokio::test]
    async fn onboarded_shop_disables_native_modules_on_render() -> Result<(), ServiceError> {
        let fx = fixture(linked(), CountingInstaller::default(), false, false);
        fx.settings.set_first_time_onboarded(1, true).await?;
        rendered(fx.service.compose(&DashboardRequest::new(1)).await?);
        assert_eq!(fx.settings.get_dashboard_modules_toggled(1).await?.as_slice().len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn render_failure_is_reported() {
        let mut fx = fixture(linked(), CountingInstaller::default(), false, false);
        let failing = Arc::new(RecordingRenderer { fail: true, ..Default::default() });
        fx.service.deps.renderer = failing;
        let err = fx.service.compose(&DashboardRequest::new(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Render(_)));
    }
}
