//! Shared runtime state: the cooldown window and the HTTP-facing app state.

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};

use crate::websocket::WsMessage;

/// The single cooldown window instance. It is owned by the trigger controller
/// (the only writer) and published through a [`watch`] channel; everything
/// else holds receivers. Whether the window is active and how much of it is
/// left are derived from `cooldown_end_time` on demand, so readers can never
/// observe a stale flag or a drifted countdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CooldownState {
    /// When the actuator last fired.
    pub last_trigger_time: Option<DateTime<Utc>>,
    /// End of the current lockout window; kept until the next fire overwrites it.
    pub cooldown_end_time: Option<DateTime<Utc>>,
}

impl CooldownState {
    /// Whether the lockout window is still running at `now`. The boundary is
    /// exclusive here, which makes a trigger exactly at the window's end
    /// admissible (the gate is inclusive).
    pub(crate) fn active(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_end_time.is_some_and(|end| now < end)
    }

    /// Remaining whole seconds of the lockout window, clamped to zero.
    pub(crate) fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        self.cooldown_end_time
            .map_or(0, |end| u64::try_from((end - now).num_seconds()).unwrap_or(0))
    }
}

pub(crate) type CooldownTx = watch::Sender<CooldownState>;
pub(crate) type CooldownRx = watch::Receiver<CooldownState>;
pub(crate) type WsTx = broadcast::Sender<WsMessage>;

/// Application state shared across request handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// Receiver for cooldown window updates.
    pub cooldown_rx: CooldownRx,
    /// Broadcast sender for distributing observer WebSocket messages.
    pub ws_tx: WsTx,
}
