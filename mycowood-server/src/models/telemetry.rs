use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Raw JSON frame as the device firmware emits it, one per line.
///
/// Every field is optional at this layer: the device prints truncated JSON
/// while booting and a status banner after reset. The mandatory readings are
/// checked in [`TelemetryRecord::decode`].
#[derive(Debug, Deserialize)]
struct DeviceFrame {
    mode: Option<String>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    soil: Option<f64>,
    alarm: Option<String>,
    muted: Option<bool>,
    #[serde(rename = "tempAlert")]
    temp_alert: Option<bool>,
    #[serde(rename = "humAlert")]
    hum_alert: Option<bool>,
    #[serde(rename = "soilAlert")]
    soil_alert: Option<bool>,
}

/// One accepted telemetry frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    /// Operating mode as reported, e.g. "Colonization" or "Fruiting".
    pub mode: Option<String>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity %
    pub humidity: f64,
    /// Soil moisture %
    pub soil_moisture: f64,
    /// NONE | WARNING | CRITICAL, interpreted by the dashboard
    pub alarm_state: Option<String>,
    pub muted: Option<bool>,
    pub temp_alert: Option<bool>,
    pub hum_alert: Option<bool>,
    pub soil_alert: Option<bool>,
    /// Receipt time stamped by the ingestion loop; the device has no clock.
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
}

impl TelemetryRecord {
    /// Decodes one device line into a record.
    ///
    /// Returns `None` for anything that is not a complete frame with numeric
    /// `temperature`, `humidity` and `soil` readings. Partial frames are
    /// routine during device boot, so rejection is silent.
    pub fn decode(line: &str, captured_at: OffsetDateTime) -> Option<Self> {
        let frame: DeviceFrame = serde_json::from_str(line.trim()).ok()?;

        Some(Self {
            mode: frame.mode,
            temperature: frame.temperature?,
            humidity: frame.humidity?,
            soil_moisture: frame.soil?,
            alarm_state: frame.alarm,
            muted: frame.muted,
            temp_alert: frame.temp_alert,
            hum_alert: frame.hum_alert,
            soil_alert: frame.soil_alert,
            captured_at,
        })
    }
}
