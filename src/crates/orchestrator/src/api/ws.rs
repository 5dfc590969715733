//! WebSocket bridge
//!
//! Subscribes to an execution's event channel and relays every event
//! verbatim to the connected client as JSON text frames, closing the socket
//! after `execution_completed`. If the execution is already terminal at
//! connect time, a synthetic terminal event is fabricated from the stored
//! record and the socket closes immediately. Events are forwarded untouched
//! so clients keep working as the taxonomy grows.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engine::events::ExecutionEvent;

use crate::api::AppState;

/// GET /ws/executions/:id
pub async fn execution_ws(
    ws: WebSocketUpgrade,
    Path(execution_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, execution_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, execution_id: String) {
    let Ok(execution_id) = Uuid::parse_str(&execution_id) else {
        warn!(raw = %execution_id, "ws connect with invalid execution id");
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    // Subscribe before inspecting stored state so no event published in
    // between is lost.
    let mut rx = state.events.subscribe(execution_id);

    let detail = match state.executions.get_execution(execution_id).await {
        Ok(detail) => detail,
        Err(err) => {
            debug!(execution_id = %execution_id, error = %err, "ws connect for unknown execution");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    if detail.status.is_terminal() {
        drop(rx);
        state.events.prune(execution_id);

        match state.executions.synthesize_completion(execution_id).await {
            Ok(event) => send_event(&mut socket, &event).await,
            Err(err) => warn!(execution_id = %execution_id, error = %err, "failed to synthesize terminal event"),
        }
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    info!(
        channel = %engine::events::EventBus::channel_name(execution_id),
        "ws subscribed"
    );

    loop {
        match rx.recv().await {
            Ok(event) => {
                send_event(&mut socket, &event).await;
                if event.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(execution_id = %execution_id, missed, "ws subscriber lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

async fn send_event(socket: &mut WebSocket, event: &ExecutionEvent) {
    match serde_json::to_string(event) {
        Ok(payload) => {
            if let Err(err) = socket.send(Message::Text(payload)).await {
                debug!(error = %err, "ws send failed, client gone");
            }
        }
        Err(err) => warn!(error = %err, "failed to serialize event"),
    }
}
