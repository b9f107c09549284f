#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log writer is not running")]
    Closed,
}
