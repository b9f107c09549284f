use super::LogError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Log error: {0}")]
    Log(#[from] LogError),
}
