//! Websocket ingestion with live progress.
//!
//! A client sends `{"github_username": "..."}` and receives one
//! `{"status": ...}` frame per progress update, followed by either the
//! ingestion result or `{"error": "..."}`. Frames without a username are
//! ignored and the socket stays open for further requests.

use crate::AppState;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use stargaze_core::{IngestObserver, Ingestor};
use stargaze_types::{IngestStatus, WsEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handler for the /ws GET endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    let ingestor = app_state.services.ingestor.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, ingestor))
}

async fn handle_socket(socket: WebSocket, ingestor: Arc<Ingestor>) {
    let connection_id = uuid::Uuid::new_v4();
    log::info!("Websocket {} connected", connection_id);

    let (mut sender, mut receiver) = socket.split();

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                log::warn!("Websocket {} receive error: {}", connection_id, e);
                break;
            }
        };

        let Some(username) = requested_username(text.as_str()) else {
            log::debug!("Websocket {} ignoring frame: {}", connection_id, text.as_str());
            continue;
        };

        log::info!(
            "Websocket {} starting ingestion for {}",
            connection_id,
            username
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { run_ingestion(&ingestor, &username, &tx).await })
        };

        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    log::error!("Failed to serialize websocket event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                log::info!(
                    "Websocket {} closed during ingestion, finishing in background",
                    connection_id
                );
                return;
            }
        }

        if let Err(e) = run.await {
            log::error!("Ingestion task failed: {}", e);
        }
    }

    log::info!("Websocket {} disconnected", connection_id);
}

/// Extract the username from an ingestion request frame.
///
/// Only JSON objects with a string `github_username` count as requests.
pub fn requested_username(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get("github_username")?
        .as_str()
        .map(|s| s.to_string())
}

/// Forwards ingestion statuses as websocket events.
struct StatusForwarder(mpsc::UnboundedSender<WsEvent>);

#[async_trait]
impl IngestObserver for StatusForwarder {
    async fn on_status(&self, status: IngestStatus) {
        let _ = self.0.send(WsEvent::Status { status });
    }
}

/// Run one ingestion and emit its status, result and error events.
pub async fn run_ingestion(
    ingestor: &Ingestor,
    username: &str,
    events: &mpsc::UnboundedSender<WsEvent>,
) {
    let observer = StatusForwarder(events.clone());

    let last = match ingestor.ingest(username, &observer).await {
        Ok(result) => WsEvent::Result(result),
        Err(e) => {
            log::error!("Ingestion for {} failed: {}", username, e);
            WsEvent::Error {
                error: e.to_string(),
            }
        }
    };

    let _ = events.send(last);
}
