mod command_service;
mod hub;
mod log_service;
mod telemetry_service;

pub use command_service::*;
pub use hub::*;
pub use log_service::*;
pub use telemetry_service::*;
