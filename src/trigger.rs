//! Cooldown-gated actuation triggered by bits notifications.
//!
//! The controller is the single writer of [`CooldownState`]; the gate check
//! and the state mutation happen inside one `send_modify` closure, so
//! concurrent notification deliveries cannot interleave between check and
//! arm. The actuator hold runs on its own task and never blocks the
//! subscription's receive loop.

use alloc::sync::Arc;
use core::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::hardware::{Actuator, AudioPlayer, Direction};
use crate::pubsub::protocol::BitsNotification;
use crate::state::{CooldownTx, WsTx};
use crate::websocket::WsMessage;

/// Drive strength of the pulse, in percent.
const PULSE_DRIVE_PERCENT: u8 = 100;
/// How long the actuator is held on per pulse.
const PULSE_DURATION: Duration = Duration::from_millis(500);
/// Played when a single-bit event fires the actuator.
const SECONDARY_ALERT_CLIP: &str = "doorbell.mp3";
/// Played for every double-bit event.
const PRIMARY_ALERT_CLIP: &str = "rooster.mp3";

/// Cooldown-gated owner of the actuator line and the cooldown state.
pub(crate) struct TriggerController {
    state_tx: CooldownTx,
    ws_tx: WsTx,
    actuator: Arc<dyn Actuator>,
    audio: Arc<dyn AudioPlayer>,
    cooldown: TimeDelta,
}

impl TriggerController {
    /// Create the controller and put the actuator into its forward direction.
    pub(crate) fn new(
        state_tx: CooldownTx,
        ws_tx: WsTx,
        actuator: Arc<dyn Actuator>,
        audio: Arc<dyn AudioPlayer>,
        cooldown_secs: u32,
    ) -> Self {
        actuator.set_direction(Direction::Forward);
        Self {
            state_tx,
            ws_tx,
            actuator,
            audio,
            cooldown: TimeDelta::seconds(i64::from(cooldown_secs)),
        }
    }

    /// Handle one decoded bits notification.
    pub(crate) fn handle(&self, event: &BitsNotification) {
        self.handle_at(event, Utc::now());
    }

    pub(crate) fn handle_at(&self, event: &BitsNotification, now: DateTime<Utc>) {
        info!(
            "Received {} bits from {} at {}",
            event.bits_used, event.user_name, event.time
        );
        match event.bits_used {
            1 => self.pulse_gated(now),
            2 => {
                info!("Playing primary alert for a 2-bit event");
                self.audio.play_clip(PRIMARY_ALERT_CLIP);
            }
            n => debug!("Ignoring bits event with {n} bits"),
        }
    }

    /// Run the cooldown gate. On a pass, arm the window, notify observers,
    /// play the secondary alert and schedule the pulse; on a miss, only log.
    fn pulse_gated(&self, now: DateTime<Utc>) {
        let mut on_cooldown = None;
        self.state_tx.send_modify(|state| {
            if state.active(now) {
                on_cooldown = Some(state.remaining_secs(now));
            } else {
                state.last_trigger_time = Some(now);
                state.cooldown_end_time = Some(now + self.cooldown);
            }
        });

        if let Some(remaining) = on_cooldown {
            info!("Actuator is on cooldown. Time remaining: {remaining} seconds");
            return;
        }

        let remaining_time = u64::try_from(self.cooldown.num_seconds()).unwrap_or(0);
        // Ignore send errors: it just means no observer is connected right now.
        drop(self.ws_tx.send(WsMessage::UpdateTimer { remaining_time }));

        info!("Playing secondary alert and pulsing the actuator");
        self.audio.play_clip(SECONDARY_ALERT_CLIP);
        self.schedule_pulse();
    }

    /// Hold the actuator at full drive for [`PULSE_DURATION`] on a separate
    /// task, so the receive loop and the heartbeat keep running meanwhile.
    fn schedule_pulse(&self) {
        let actuator = Arc::clone(&self.actuator);
        tokio::spawn(async move {
            actuator.set_drive(PULSE_DRIVE_PERCENT);
            tokio::time::sleep(PULSE_DURATION).await;
            actuator.set_drive(0);
            debug!("Actuator released after {PULSE_DURATION:?} hold");
        });
    }
}
