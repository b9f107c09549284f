use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::errors::ApiError;
use crate::services::LogService;

#[derive(Clone)]
pub struct LogState {
    pub log_service: Arc<LogService>,
}

/// Full dump of the telemetry dataset in its on-disk CSV form.
pub async fn get_logs(State(state): State<LogState>) -> Result<impl IntoResponse, ApiError> {
    let csv = state.log_service.read_all().await?;

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}
