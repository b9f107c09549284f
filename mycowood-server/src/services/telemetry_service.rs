use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use serialport::SerialPort;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task;

use crate::configs::Device;
use crate::errors::DeviceError;
use crate::models::TelemetryRecord;
use crate::services::{CommandService, LogService, TelemetryHub};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Poll interval of the blocking serial read; a timeout only means the
/// device is quiet.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Lines buffered between the blocking reader and the async loop.
const LINE_BUFFER: usize = 64;

/// Owns the device connection and drives the decode -> fan-out -> append
/// pipeline for the process lifetime.
pub struct TelemetryService {
    device: Device,
    hub: Arc<TelemetryHub>,
    log: Arc<LogService>,
    commands: Arc<CommandService>,
}

impl TelemetryService {
    pub fn new(
        device: Device,
        hub: Arc<TelemetryHub>,
        log: Arc<LogService>,
        commands: Arc<CommandService>,
    ) -> Self {
        Self {
            device,
            hub,
            log,
            commands,
        }
    }

    /// Runs forever: connect, stream, and on any device failure reconnect
    /// with exponential backoff.
    pub async fn run(self) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            tracing::info!(port = %self.device.port_path, "connecting to device");

            match self.connect() {
                Ok(port) => {
                    backoff = INITIAL_BACKOFF;

                    match self.stream(port).await {
                        Ok(()) => tracing::warn!("device stream ended"),
                        Err(e) => tracing::warn!("device stream failed: {}", e),
                    }

                    self.commands.detach().await;
                }
                Err(e) => {
                    tracing::warn!(port = %self.device.port_path, "device unavailable: {}", e);
                }
            }

            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    fn connect(&self) -> Result<Box<dyn SerialPort>, DeviceError> {
        let port = serialport::new(&self.device.port_path, self.device.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .timeout(READ_TIMEOUT)
            .open()?;

        Ok(port)
    }

    /// Streams lines from an open connection until the device goes away.
    ///
    /// The inbound and outbound halves of the connection are independent:
    /// reads run here, writes go through the [`CommandService`] clone.
    async fn stream(&self, port: Box<dyn SerialPort>) -> Result<(), DeviceError> {
        let writer = port.try_clone()?;
        self.commands.attach(writer).await;

        let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
        let reader = task::spawn_blocking(move || read_lines(port, tx));

        tracing::info!("device stream established");

        while let Some(line) = rx.recv().await {
            self.process_line(&line).await;
        }

        match reader.await {
            Ok(result) => result.map_err(DeviceError::Io),
            Err(e) => {
                tracing::error!("device reader task failed: {}", e);
                Err(DeviceError::Disconnected)
            }
        }
    }

    /// Decodes one line and, if it yields a record, hands it to the hub and
    /// the log. The two sinks are independent; neither can fail the other,
    /// and a rejected line never affects later ones.
    async fn process_line(&self, line: &str) {
        let Some(record) = TelemetryRecord::decode(line, OffsetDateTime::now_utc()) else {
            tracing::trace!(line, "frame dropped");
            return;
        };

        self.hub.publish(record.clone()).await;
        self.log.append(&record);
    }
}

/// Blocking read half: accumulates chunks and emits complete lines.
///
/// Returns when the port errors out or the async side goes away.
fn read_lines(mut port: Box<dyn SerialPort>, tx: mpsc::Sender<String>) -> io::Result<()> {
    let mut pending = Vec::new();
    let mut chunk = [0u8; 256];

    loop {
        match port.read(&mut chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "device closed the connection",
                ));
            }
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);

                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = pending.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&raw).trim().to_string();

                    if tx.blocking_send(line).is_err() {
                        return Ok(());
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
