//! Hardware collaborator seams: the PWM actuator and the alert clip player.
//!
//! The service drives exactly one actuator line and fires clips without
//! waiting on them, so the seams stay small. Board bindings (GPIO PWM, audio
//! output) implement these traits; the logging stand-ins below keep the
//! service runnable on a machine without either.

use tracing::info;

/// Direction the actuator line drives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// A PWM-driven actuator (the coop light/feeder motor).
pub trait Actuator: Send + Sync {
    /// Set drive strength in percent, 0 (off) to 100 (full).
    fn set_drive(&self, percent: u8);
    /// Set the direction the line drives in.
    fn set_direction(&self, direction: Direction);
}

/// Fire-and-forget alert clip playback.
pub trait AudioPlayer: Send + Sync {
    fn play_clip(&self, clip: &str);
}

/// Stand-in actuator that only logs drive changes.
pub struct LoggingActuator;

impl Actuator for LoggingActuator {
    fn set_drive(&self, percent: u8) {
        info!("Actuator drive set to {percent}%");
    }

    fn set_direction(&self, direction: Direction) {
        info!("Actuator direction set to {direction:?}");
    }
}

/// Stand-in clip player that only logs playback.
pub struct LoggingAudio;

impl AudioPlayer for LoggingAudio {
    fn play_clip(&self, clip: &str) {
        info!("Playing clip {clip}");
    }
}
