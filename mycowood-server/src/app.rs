use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::Settings;
use crate::handles::{LogState, SocketState, get_logs, ws_handler};
use crate::services::{CommandService, LogService, TelemetryHub, TelemetryService};

/// Long-lived services shared by the router and the ingestion loop.
pub struct AppContext {
    pub hub: Arc<TelemetryHub>,
    pub log_service: Arc<LogService>,
    pub commands: Arc<CommandService>,
}

pub fn build_router(context: &AppContext) -> Router {
    let logs = Router::new().route("/logs", get(get_logs)).with_state(LogState {
        log_service: context.log_service.clone(),
    });

    let socket = Router::new().route("/ws", get(ws_handler)).with_state(SocketState {
        hub: context.hub.clone(),
        commands: context.commands.clone(),
    });

    Router::new()
        .nest("/api", logs)
        .merge(socket)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Wires the services, spawns the ingestion loop, and returns the router.
pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let hub = Arc::new(TelemetryHub::new());
    let log_service = Arc::new(LogService::start(&settings.log.path).await?);
    let commands = Arc::new(CommandService::new());

    let ingest = TelemetryService::new(
        settings.device.clone(),
        hub.clone(),
        log_service.clone(),
        commands.clone(),
    );
    tokio::spawn(ingest.run());

    let context = AppContext {
        hub,
        log_service,
        commands,
    };

    Ok(build_router(&context))
}
