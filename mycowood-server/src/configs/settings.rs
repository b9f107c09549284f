use std::env;
use std::error::Error;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub port_path: String,
    pub baud_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub device: Device,
    pub log: Log,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let mut settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        // Deployment-specific paths are taken from the environment when set.
        if let Ok(port_path) = env::var("MYCOWOOD_DEVICE_PORT") {
            settings.device.port_path = port_path;
        }
        if let Ok(log_path) = env::var("MYCOWOOD_LOG_PATH") {
            settings.log.path = log_path;
        }

        Ok(settings)
    }
}
