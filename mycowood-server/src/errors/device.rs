#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to open serial port: {0}")]
    Open(#[from] serialport::Error),

    #[error("Device I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device is not connected")]
    Disconnected,
}
