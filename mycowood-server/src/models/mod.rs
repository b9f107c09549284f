pub mod message;
pub mod telemetry;

pub use message::{ClientMessage, ServerMessage};
pub use telemetry::TelemetryRecord;
