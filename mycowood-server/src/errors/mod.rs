pub mod api;
pub mod device;
pub mod log;

pub use api::ApiError;
pub use device::DeviceError;
pub use log::LogError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Log(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!("request failed: {}", self);

        let body = Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
