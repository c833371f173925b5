//! HTTP surface: the countdown page, the pull accessor and the observer socket.

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{any, get},
};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;
use crate::websocket;

/// Countdown view returned by the pull accessor.
#[derive(Debug, Serialize)]
struct RemainingTime {
    remaining_time: u64,
}

/// Creates the application router.
pub(crate) fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/remaining", get(remaining_time))
        .route("/ws", any(websocket::ws_handler))
        .with_state(app_state)
}

/// Serves the countdown page with the current state injected.
async fn serve_index(State(AppState { cooldown_rx, .. }): State<AppState>) -> Html<String> {
    let (remaining, last_trigger) = {
        let state = cooldown_rx.borrow();
        let last = state.last_trigger_time.map_or_else(
            || "never".to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        (state.remaining_secs(Utc::now()), last)
    };

    Html(
        include_str!("../assets/index.html")
            .replace("{remaining_time}", &remaining.to_string())
            .replace("{last_trigger}", &last_trigger)
            .replace("{description}", env!("CARGO_PKG_DESCRIPTION")),
    )
}

/// Pull accessor for the current countdown; 0 before any trigger.
async fn remaining_time(
    State(AppState { cooldown_rx, .. }): State<AppState>,
) -> Json<RemainingTime> {
    let remaining_time = cooldown_rx.borrow().remaining_secs(Utc::now());
    Json(RemainingTime { remaining_time })
}
