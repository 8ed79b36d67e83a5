//! Mutable state owned by the gesture engine.
//!
//! Touched only on frames where a hand is present; timestamps are
//! monotonic milliseconds supplied by the frame loop, with 0 meaning
//! "not set".

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::landmarks::Handedness;

/// Externally reported gesture label. Changes are debounced; the
/// click/drag logic reacts to the raw classifier output immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureLabel {
    None,
    Fist,
    Peace,
    OpenHand,
    Pinch,
    VolumeControl,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Fist => "Fist",
            Self::Peace => "Peace",
            Self::OpenHand => "Open Hand",
            Self::Pinch => "Pinch",
            Self::VolumeControl => "Volume Control",
        }
    }
}

/// Which shape the task-view alternation saw last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskViewArm {
    Fist,
    OpenHand,
}

#[derive(Debug, Clone)]
pub struct GestureState {
    /// Pointer mapping active (the activation toggle).
    pub cursor_active: bool,
    pub dragging: bool,
    /// Smoothed cursor position in [0,1].
    pub cursor: Point,
    /// 0 = not pinching.
    pub pinch_start_ms: u64,

    // Activation toggle (Fist then Peace-hold).
    pub toggle_armed: bool,
    pub last_toggle_ms: u64,
    pub peace_hold_start_ms: u64,

    /// Thumb–index midpoint captured at activation, unmirrored.
    pub reference_center: Option<Point>,
    /// Smoothed body anchor captured at activation, mirrored x.
    pub reference_body: Option<Point>,
    /// EMA of the body anchor, mirrored x.
    pub smooth_body: Option<Point>,

    pub active_hand: Option<Handedness>,

    // Per-feature cooldowns and holds.
    pub last_swipe_ms: u64,
    pub task_view_arm: Option<TaskViewArm>,
    pub last_task_view_ms: u64,
    pub open_hand_hold_start_ms: u64,
    pub fist_hold_start_ms: u64,

    // Reported-label debounce.
    pub last_gesture: GestureLabel,
    pub last_gesture_change_ms: u64,

    // Volume-by-ear.
    pub volume_active: bool,
    pub volume_start_ms: u64,
    pub last_volume_ms: u64,
    /// Internal 0–100 level mirror of the system volume.
    pub volume_level: i32,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            cursor_active: false,
            dragging: false,
            cursor: Point::new(0.5, 0.5),
            pinch_start_ms: 0,
            toggle_armed: false,
            last_toggle_ms: 0,
            peace_hold_start_ms: 0,
            reference_center: None,
            reference_body: None,
            smooth_body: None,
            active_hand: None,
            last_swipe_ms: 0,
            task_view_arm: None,
            last_task_view_ms: 0,
            open_hand_hold_start_ms: 0,
            fist_hold_start_ms: 0,
            last_gesture: GestureLabel::None,
            last_gesture_change_ms: 0,
            volume_active: false,
            volume_start_ms: 0,
            last_volume_ms: 0,
            volume_level: 50,
        }
    }
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every spatial reference so the next frames re-establish them.
    /// Used when the tracked hand changes sides.
    pub fn invalidate_spatial_references(&mut self) {
        self.reference_center = None;
        self.reference_body = None;
        self.smooth_body = None;
    }
}
