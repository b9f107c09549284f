use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use mycowood_server::app::{AppContext, build_router};
use mycowood_server::services::{CommandService, LogService, TelemetryHub};

/// Router plus its services, wired against a temporary dataset and no
/// device, for driving the HTTP surface directly.
pub struct MockApp {
    pub router: Router,
    pub hub: Arc<TelemetryHub>,
    pub log_service: Arc<LogService>,
    pub commands: Arc<CommandService>,
    _log_dir: TempDir,
}

impl MockApp {
    pub async fn new() -> Self {
        let log_dir = tempfile::tempdir().unwrap();

        let hub = Arc::new(TelemetryHub::new());
        let log_service = Arc::new(
            LogService::start(log_dir.path().join("mycowood_logs.csv"))
                .await
                .unwrap(),
        );
        let commands = Arc::new(CommandService::new());

        let context = AppContext {
            hub: hub.clone(),
            log_service: log_service.clone(),
            commands: commands.clone(),
        };

        Self {
            router: build_router(&context),
            hub,
            log_service,
            commands,
            _log_dir: log_dir,
        }
    }
}
