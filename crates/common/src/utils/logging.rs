use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: request traces plus the dashboard's
/// redirect and asset decisions.
pub const DEFAULT_FILTER: &str = "info,tower_http=info,service::dashboard=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Read a `LOG_FORMAT` value; anything but `json` keeps the compact output.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Install the global subscriber, writing to stdout. A second call is a no-op.
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(env_filter).with_target(false).with_writer(io::stdout);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
