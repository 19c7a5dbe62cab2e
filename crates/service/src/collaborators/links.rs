use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::LinkGenerator;

pub const METRICS_PAGE: &str = "metrics_page";
pub const METRICS_API_RESOLVER: &str = "metrics_api_resolver";
pub const METRICS_GRAPHQL: &str = "metrics_graphql";

// RFC 3986 unreserved characters stay as-is
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Route-name to path table for the admin URLs the dashboard hands out.
#[derive(Debug, Clone)]
pub struct RouteTableLinks {
    base_url: String,
    routes: BTreeMap<String, String>,
}

impl Default for RouteTableLinks {
    fn default() -> Self {
        Self::new("")
    }
}

impl RouteTableLinks {
    /// `base_url` is prepended verbatim, e.g. `""` or `"https://shop.example.com"`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let routes = [
            (METRICS_PAGE, "/admin/metrics"),
            (METRICS_API_RESOLVER, "/admin/metrics/api"),
            (METRICS_GRAPHQL, "/admin/metrics/graphql"),
        ]
        .into_iter()
        .map(|(name, path)| (name.to_string(), path.to_string()))
        .collect();
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), routes }
    }

    pub fn with_route(mut self, name: &str, path: &str) -> Self {
        self.routes.insert(name.to_string(), path.to_string());
        self
    }

    fn path(&self, route: &str) -> String {
        match self.routes.get(route) {
            Some(path) => format!("{}{}", self.base_url, path),
            None => format!("{}/admin/{}", self.base_url, route),
        }
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

impl LinkGenerator for RouteTableLinks {
    fn admin_link(&self, route: &str, token: Option<&str>, params: &[(&str, String)]) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            query.push(format!("_token={}", encode(token)));
        }
        let path = self.path(route);
        if query.is_empty() { path } else { format!("{}?{}", path, query.join("&")) }
    }

    fn link_without_token(&self, route: &str) -> String {
        self.path(route)
    }
}
