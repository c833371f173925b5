//! Push surface for countdown observers.
//!
//! Observers (the countdown page) connect to `/ws` and receive best-effort
//! `update_timer` broadcasts; there is no buffering and no delivery
//! guarantee. During a pub/sub outage observers simply see no updates.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::AppState;

/// Messages pushed to countdown observers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WsMessage {
    /// Sent after every successful trigger, and once on connect so a fresh
    /// observer starts from the current countdown.
    UpdateTimer { remaining_time: u64 },
}

/// Gets called for every new observer and runs its event loop.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(AppState { cooldown_rx, ws_tx }): State<AppState>,
) -> impl IntoResponse {
    let remaining_time = cooldown_rx.borrow().remaining_secs(Utc::now());
    ws.on_upgrade(move |socket| observer_loop(socket, ws_tx.subscribe(), remaining_time))
}

async fn send_ws_message(socket: &mut WebSocket, msg: &WsMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to serialize websocket message: {}", e);
            Err(axum::Error::new(e))
        }
    }
}

/// One event loop per connected observer: current state first, then relayed
/// broadcasts until either side goes away.
async fn observer_loop(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<WsMessage>,
    remaining_time: u64,
) {
    let initial = WsMessage::UpdateTimer { remaining_time };
    if let Err(e) = send_ws_message(&mut socket, &initial).await {
        warn!("Failed to send initial state: {}", e);
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(msg) => {
                        if let Err(e) = send_ws_message(&mut socket, &msg).await {
                            debug!("Failed to send message, closing connection: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Observer lagged behind by {skipped} updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Detect when the observer goes away.
            None = socket.recv() => {
                debug!("Observer disconnected");
                break;
            }
        }
    }
}
