use serde_json::Value;

use super::TemplateRenderer;
use crate::errors::ServiceError;

/// Minimal page shell for the single-page dashboard app: stylesheet and
/// bundle tags plus every parameter exposed as `window.metricsContext`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlShellRenderer;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn required<'a>(params: &'a Value, key: &str) -> Result<&'a str, ServiceError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ServiceError::Render(format!("missing string parameter {key}")))
}

impl TemplateRenderer for HtmlShellRenderer {
    fn render(&self, template: &str, params: &Value) -> Result<String, ServiceError> {
        if !params.is_object() {
            return Err(ServiceError::Render("parameters must be an object".into()));
        }
        let title = required(params, "layoutTitle")?;
        let app = required(params, "pathMetricsApp")?;
        let assets = required(params, "pathMetricsAssets")?;
        let lang = params.get("isoCode").and_then(Value::as_str).unwrap_or("en");

        let context = serde_json::to_string(params)
            .map_err(|e| ServiceError::Render(e.to_string()))?
            .replace("</", "<\\/");

        Ok(format!(
            concat!(
                "<!DOCTYPE html>\n",
                "<html lang=\"{lang}\">\n",
                "<head>\n",
                "<meta charset=\"utf-8\">\n",
                "<title>{title}</title>\n",
                "<link rel=\"stylesheet\" href=\"{assets}\">\n",
                "</head>\n",
                "<body>\n",
                "<div id=\"metrics-app\" data-template=\"{template}\"></div>\n",
                "<script>window.metricsContext = {context};</script>\n",
                "<script src=\"{app}\"></script>\n",
                "</body>\n",
                "</html>\n"
            ),
            lang = escape_html(lang),
            title = escape_html(title),
            assets = escape_html(assets),
            template = escape_html(template),
            context = context,
            app = escape_html(app),
        ))
    }
}
