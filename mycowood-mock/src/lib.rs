use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::settings::Settings;

pub mod settings;
pub mod simulate;

// Threshold profile of the production firmware.
const COL_TEMP_RANGE: (f64, f64) = (18.0, 27.0);
const FRU_TEMP_RANGE: (f64, f64) = (18.0, 24.0);
const FRU_HUM_RANGE: (f64, f64) = (80.0, 95.0);
const FRU_SOIL_RANGE: (f64, f64) = (45.0, 75.0);

#[derive(Debug, Clone, Copy, PartialEq)]
enum SystemMode {
    Colonization,
    Fruiting,
}

impl SystemMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Colonization => "Colonization",
            Self::Fruiting => "Fruiting",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChamberState {
    mode: SystemMode,
    muted: bool,
}

/// One telemetry line, field names exactly as the firmware prints them.
#[derive(Debug, Serialize)]
struct Frame {
    mode: &'static str,
    temperature: f64,
    humidity: f64,
    soil: i64,
    alarm: &'static str,
    #[serde(rename = "tempAlert")]
    temp_alert: bool,
    #[serde(rename = "humAlert")]
    hum_alert: bool,
    #[serde(rename = "soilAlert")]
    soil_alert: bool,
    muted: bool,
}

/// Emits one frame per interval on stdout and applies commands arriving on
/// stdin, mirroring the serial behavior of the real controller.
pub async fn run(settings: &Arc<Settings>) {
    let mut state = ChamberState {
        mode: SystemMode::Colonization,
        muted: false,
    };

    let mut interval = tokio::time::interval(Duration::from_millis(settings.mock.interval_ms));
    let mut stdout = tokio::io::stdout();

    let (tx, mut commands) = mpsc::channel::<String>(16);
    tokio::spawn(read_commands(tx));

    // The firmware announces itself before the first telemetry frame.
    if write_line(&mut stdout, "{\"status\": \"System Initialized via Serial\"}")
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let frame = build_frame(&state);

                let line = match serde_json::to_string(&frame) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("failed to serialize frame: {}", e);
                        continue;
                    }
                };

                if write_line(&mut stdout, &line).await.is_err() {
                    tracing::info!("wire closed, stopping");
                    break;
                }
            }
            command = commands.recv() => {
                match command {
                    Some(command) => apply_command(&mut state, command.trim()),
                    None => break,
                }
            }
        }
    }
}

async fn write_line(stdout: &mut tokio::io::Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

async fn read_commands(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            return;
        }
    }
}

/// The firmware compares case-insensitively and ignores anything unknown.
fn apply_command(state: &mut ChamberState, command: &str) {
    if command.eq_ignore_ascii_case("FRUITING") {
        state.mode = SystemMode::Fruiting;
        tracing::info!("switched to fruiting mode");
    } else if command.eq_ignore_ascii_case("COLONIZATION") {
        state.mode = SystemMode::Colonization;
        tracing::info!("switched to colonization mode");
    } else if command.eq_ignore_ascii_case("MUTE") {
        state.muted = true;
    } else if command.eq_ignore_ascii_case("UNMUTE") {
        state.muted = false;
    } else {
        tracing::debug!(command, "unknown command ignored");
    }
}

fn build_frame(state: &ChamberState) -> Frame {
    let mut rng = rand::rng();
    let fraction = day_fraction(OffsetDateTime::now_utc());

    let temperature =
        round1(simulate::simulated_temperature(fraction) + rng.random_range(-0.3..0.3));
    let humidity = round1(simulate::simulated_humidity(fraction) + rng.random_range(-1.0..1.0));
    let soil = (simulate::simulated_soil(fraction) + rng.random_range(-2.0..2.0)).round() as i64;

    let (temp_alert, hum_alert, soil_alert, alarm) = evaluate(state, temperature, humidity, soil);

    Frame {
        mode: state.mode.as_str(),
        temperature,
        humidity,
        soil,
        alarm,
        temp_alert,
        hum_alert,
        soil_alert,
        muted: state.muted,
    }
}

/// Colonization only watches temperature; fruiting checks all three
/// channels. Any breach raises WARNING.
fn evaluate(
    state: &ChamberState,
    temperature: f64,
    humidity: f64,
    soil: i64,
) -> (bool, bool, bool, &'static str) {
    let (temp_alert, hum_alert, soil_alert) = match state.mode {
        SystemMode::Colonization => (out_of(temperature, COL_TEMP_RANGE), false, false),
        SystemMode::Fruiting => (
            out_of(temperature, FRU_TEMP_RANGE),
            out_of(humidity, FRU_HUM_RANGE),
            out_of(soil as f64, FRU_SOIL_RANGE),
        ),
    };

    let alarm = if temp_alert || hum_alert || soil_alert {
        "WARNING"
    } else {
        "NONE"
    };

    (temp_alert, hum_alert, soil_alert, alarm)
}

fn out_of(value: f64, (min, max): (f64, f64)) -> bool {
    value < min || value > max
}

fn day_fraction(now: OffsetDateTime) -> f64 {
    let time = now.time();
    let seconds =
        time.hour() as f64 * 3600.0 + time.minute() as f64 * 60.0 + time.second() as f64;

    seconds / 86_400.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
