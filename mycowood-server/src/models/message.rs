use serde::{Deserialize, Serialize};

use super::telemetry::TelemetryRecord;

/// Messages pushed to connected dashboards.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    SensorData { data: TelemetryRecord },
}

/// Messages received from dashboards.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    SendCommand { command: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_sensor_data_wire_shape() {
        let record = TelemetryRecord {
            mode: Some("Fruiting".to_string()),
            temperature: 24.5,
            humidity: 61.2,
            soil_moisture: 38.0,
            alarm_state: Some("NONE".to_string()),
            muted: None,
            temp_alert: None,
            hum_alert: None,
            soil_alert: None,
            captured_at: datetime!(2026-02-25 22:30:05 UTC),
        };

        let text = serde_json::to_string(&ServerMessage::SensorData { data: record }).unwrap();

        assert!(text.contains(r#""type":"sensorData""#));
        assert!(text.contains(r#""soilMoisture":38.0"#));
        assert!(text.contains(r#""alarmState":"NONE""#));
        assert!(text.contains(r#""capturedAt":"2026-02-25T22:30:05Z""#));
    }

    #[test]
    fn test_send_command_wire_shape() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"sendCommand","command":"FRUITING"}"#).unwrap();

        let ClientMessage::SendCommand { command } = message;
        assert_eq!(command, "FRUITING");
    }
}
