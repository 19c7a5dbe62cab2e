use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::errors::ServiceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Service(ServiceError::Install(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Service(ServiceError::MalformedValue { .. } | ServiceError::Render(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();
        let code = match &self {
            ApiError::BadRequest(_) => 1000,
            ApiError::Service(e) => e.code(),
        };
        if status.is_server_error() {
            error!(error = %msg, code, "request failed");
        }
        (status, Json(serde_json::json!({"error": msg, "code": code}))).into_response()
    }
}
