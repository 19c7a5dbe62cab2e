use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("malformed value stored under {key}: {source}")]
    MalformedValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("render failed: {0}")]
    Render(String),
    #[error("install failed: {0}")]
    Install(String),
}

impl ServiceError {
    pub fn store(err: impl std::fmt::Display) -> Self { Self::StoreUnavailable(err.to_string()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::StoreUnavailable(_) => 1200,
            ServiceError::MalformedValue { .. } => 1201,
            ServiceError::Render(_) => 1300,
            ServiceError::Install(_) => 1400,
        }
    }
}
