use std::io::Write;

use tokio::sync::Mutex;

use crate::errors::DeviceError;

/// Relays operator commands to the device.
///
/// The outbound half of the device link is attached by the ingestion loop
/// once a connection is up and detached when it drops. The mutex admits one
/// in-flight write at a time and queues concurrent senders in arrival order,
/// so no two commands interleave on the wire.
pub struct CommandService {
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

impl CommandService {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(None),
        }
    }

    /// Installs the outbound half of a freshly opened device connection.
    pub async fn attach(&self, writer: impl Write + Send + 'static) {
        *self.writer.lock().await = Some(Box::new(writer));
    }

    /// Drops the outbound half after the device link failed.
    pub async fn detach(&self) {
        *self.writer.lock().await = None;
    }

    /// Writes `command` plus the device line terminator.
    ///
    /// Commands are forwarded verbatim; interpreting them is the device's
    /// job, not ours.
    pub async fn send(&self, command: &str) -> Result<(), DeviceError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(DeviceError::Disconnected)?;

        writer.write_all(command.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::debug!(command, "command forwarded to device");
        Ok(())
    }
}
