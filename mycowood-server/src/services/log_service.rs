use std::path::{Path, PathBuf};

use time::format_description::BorrowedFormatItem;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::errors::LogError;
use crate::models::TelemetryRecord;

/// Fixed header of the telemetry dataset.
pub const LOG_HEADER: &str =
    "Timestamp,System Mode,Temperature (C),Humidity (%),Soil Moisture (%),Alarm State";

/// Pending operations before appends start being dropped (and reported).
const OP_BUFFER: usize = 256;

/// Row timestamps keep the format of the original dashboard logs.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    time::macros::format_description!("[day]/[month]/[year], [hour]:[minute]:[second]");

enum LogOp {
    Append(String),
    ReadAll(oneshot::Sender<std::io::Result<String>>),
}

/// Owner of the append-only CSV dataset.
///
/// All writes go through one task holding the file handle, so concurrent
/// appends can never interleave partial rows. Reads are serialized through
/// the same task and therefore observe every append enqueued before them.
pub struct LogService {
    ops: mpsc::Sender<LogOp>,
}

impl LogService {
    /// Opens the dataset at `path`, creating it with its header if needed,
    /// and spawns the writer task that owns the file for the process
    /// lifetime.
    pub async fn start(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = Self::ensure_initialized(&path).await?;

        let (ops, rx) = mpsc::channel(OP_BUFFER);
        tokio::spawn(writer_task(path, file, rx));

        Ok(Self { ops })
    }

    /// Creates the dataset with its header exactly once; reopening an
    /// existing dataset leaves its contents untouched.
    async fn ensure_initialized(path: &Path) -> Result<File, LogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        if file.metadata().await?.len() == 0 {
            file.write_all(LOG_HEADER.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await?;

            tracing::info!(path = %path.display(), "created new telemetry log");
        }

        Ok(file)
    }

    /// Queues one record for appending.
    ///
    /// Never blocks the caller: if the writer has fallen behind, the row is
    /// dropped and the loss reported.
    pub fn append(&self, record: &TelemetryRecord) {
        let row = format_row(record);

        if let Err(e) = self.ops.try_send(LogOp::Append(row)) {
            tracing::error!("telemetry log append dropped: {}", e);
        }
    }

    /// Returns the complete dataset as CSV text, reflecting every append
    /// enqueued before this call.
    pub async fn read_all(&self) -> Result<String, LogError> {
        let (tx, rx) = oneshot::channel();

        self.ops
            .send(LogOp::ReadAll(tx))
            .await
            .map_err(|_| LogError::Closed)?;

        rx.await.map_err(|_| LogError::Closed)?.map_err(LogError::Io)
    }
}

async fn writer_task(path: PathBuf, mut file: File, mut ops: mpsc::Receiver<LogOp>) {
    while let Some(op) = ops.recv().await {
        match op {
            LogOp::Append(row) => {
                if let Err(e) = append_row(&mut file, &row).await {
                    tracing::error!(path = %path.display(), "failed to append telemetry row: {}", e);
                }
            }
            LogOp::ReadAll(reply) => {
                let _ = reply.send(fs::read_to_string(&path).await);
            }
        }
    }
}

async fn append_row(file: &mut File, row: &str) -> std::io::Result<()> {
    file.write_all(row.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

/// Serializes a record as one CSV row: free-text fields quoted, numeric
/// fields bare.
fn format_row(record: &TelemetryRecord) -> String {
    let timestamp = record
        .captured_at
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| record.captured_at.to_string());

    format!(
        "{},{},{},{},{},{}",
        quote(&timestamp),
        quote(record.mode.as_deref().unwrap_or_default()),
        record.temperature,
        record.humidity,
        record.soil_moisture,
        quote(record.alarm_state.as_deref().unwrap_or_default()),
    )
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use time::macros::datetime;

    use super::*;

    fn record(temperature: f64, captured_at: OffsetDateTime) -> TelemetryRecord {
        TelemetryRecord {
            mode: Some("Fruiting".to_string()),
            temperature,
            humidity: 61.2,
            soil_moisture: 38.0,
            alarm_state: Some("NONE".to_string()),
            muted: None,
            temp_alert: None,
            hum_alert: None,
            soil_alert: None,
            captured_at,
        }
    }

    #[test]
    fn test_row_format_matches_dataset_layout() {
        let row = format_row(&record(24.5, datetime!(2026-02-25 22:30:05 UTC)));

        assert_eq!(row, r#""25/02/2026, 22:30:05","Fruiting",24.5,61.2,38,"NONE""#);
    }

    #[test]
    fn test_row_format_leaves_missing_text_fields_empty() {
        let mut record = record(24.5, datetime!(2026-02-25 22:30:05 UTC));
        record.mode = None;
        record.alarm_state = None;

        let row = format_row(&record);

        assert_eq!(row, r#""25/02/2026, 22:30:05","",24.5,61.2,38,"""#);
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        assert_eq!(quote(r#"say "hi""#), r#""say ""hi""""#);
    }

    #[tokio::test]
    async fn test_initialization_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let service = LogService::start(&path).await.unwrap();
        let text = service.read_all().await.unwrap();

        assert_eq!(text, format!("{LOG_HEADER}\n"));
    }

    #[tokio::test]
    async fn test_appends_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let service = LogService::start(dir.path().join("log.csv")).await.unwrap();

        let at = datetime!(2026-02-25 22:30:05 UTC);
        for temperature in [20.0, 21.0, 22.0] {
            service.append(&record(temperature, at));
        }

        let text = service.read_all().await.unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], LOG_HEADER);
        assert!(lines[1].contains(",20,"));
        assert!(lines[2].contains(",21,"));
        assert!(lines[3].contains(",22,"));
    }

    #[tokio::test]
    async fn test_reinitialization_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let service = LogService::start(&path).await.unwrap();
        service.append(&record(24.5, datetime!(2026-02-25 22:30:05 UTC)));
        // read_all drains the append before the service goes away
        service.read_all().await.unwrap();
        drop(service);

        let reopened = LogService::start(&path).await.unwrap();
        let text = reopened.read_all().await.unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], LOG_HEADER);
        assert_eq!(text.matches(LOG_HEADER).count(), 1);
    }
}
