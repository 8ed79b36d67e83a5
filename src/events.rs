//! Events emitted by the engine for external consumers (UI process,
//! notification sink). Delivery is fire-and-forget over an unbounded
//! channel; a closed receiver never disturbs the frame loop.

use serde::Serialize;

use crate::activity::ActivityEntry;
use crate::gesture::GestureLabel;
use crate::posture::{AlertNotice, PostureLabel};
use crate::timer::TimerSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    PostureChanged {
        label: PostureLabel,
        confidence: u8,
    },
    GestureStatus {
        label: GestureLabel,
        hint: String,
    },
    CursorMoved {
        x: f64,
        y: f64,
    },
    CursorHidden,
    /// The pointer-activation toggle flipped.
    ActivationChanged {
        active: bool,
    },
    /// Manual timer control took effect.
    TimerChanged(TimerSnapshot),
    /// Per-second heartbeat while the timer runs and a person is present.
    TimerTick(TimerSnapshot),
    AlertRaised(AlertNotice),
    AlertDismissed,
    VolumeChanged {
        level: i32,
    },
    LinkStatus {
        connected: bool,
    },
    Activity(ActivityEntry),
}
