use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::models::{ClientMessage, ServerMessage};
use crate::services::{CommandService, TelemetryHub};

#[derive(Clone)]
pub struct SocketState {
    pub hub: Arc<TelemetryHub>,
    pub commands: Arc<CommandService>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SocketState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SocketState) {
    let (mut sender, mut receiver) = socket.split();
    let (subscriber_id, mut records) = state.hub.subscribe().await;

    tracing::info!(subscriber = %subscriber_id, "dashboard connected");

    let push_task = tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            let message = ServerMessage::SensorData { data: record };

            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("failed to serialize record: {}", e);
                    continue;
                }
            };

            if sender.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::SendCommand { command }) => {
                    if let Err(e) = state.commands.send(&command).await {
                        tracing::warn!(command, "command not delivered: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!("unrecognized dashboard message: {}", e);
                }
            },
            Ok(WsMessage::Close(_)) => break,
            Err(e) => {
                tracing::warn!(subscriber = %subscriber_id, "websocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    push_task.abort();
    state.hub.unsubscribe(&subscriber_id).await;

    tracing::info!(subscriber = %subscriber_id, "dashboard disconnected");
}
