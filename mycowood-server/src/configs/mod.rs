pub mod settings;

pub use settings::{Device, Log, Logger, Server, Settings};
