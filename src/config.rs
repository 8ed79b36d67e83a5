use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Gesture tuning: thresholds and windows for the hand state machines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Pinch closes when index–thumb distance drops below 0.6x this value.
    pub pinch_distance: f64,
    /// Wrist-to-middle-tip distance below this means the hand is too far
    /// away to trust.
    pub min_hand_size: f64,
    /// Index-tip-to-ear distance that activates volume control.
    pub ear_touch_distance: f64,
    /// Pointer delta amplification.
    pub sensitivity: f64,
    /// Per-axis deltas below this are zeroed (tremor suppression).
    pub deadzone: f64,
    /// Share of the previous cursor position kept each frame.
    pub cursor_smoothing: f64,
    /// Share of the previous body anchor kept each frame.
    pub body_anchor_smoothing: f64,
    /// Peace must follow Fist within this window to toggle activation.
    pub toggle_window_ms: u64,
    /// Peace hold required to flip the activation toggle.
    pub peace_hold_ms: u64,
    /// Pinch sustained this long becomes a drag instead of a click.
    pub pinch_hold_ms: u64,
    /// Reported gesture label must be stable this long before it changes.
    pub gesture_debounce_ms: u64,
    /// Horizontal delta that triggers a desktop switch.
    pub swipe_threshold: f64,
    pub swipe_cooldown_ms: u64,
    /// Virtual-center offset by active hand when no reference exists.
    pub swipe_hand_offset: f64,
    pub task_view_hold_ms: u64,
    pub task_view_cooldown_ms: u64,
    /// Index tip must be this far above/below the ear to step the volume.
    pub volume_vertical_threshold: f64,
    pub volume_change_interval_ms: u64,
    /// Internal volume level step per change, percent.
    pub volume_step: i32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_distance: 0.07,
            min_hand_size: 0.05,
            ear_touch_distance: 0.1,
            sensitivity: 8.0,
            deadzone: 0.01,
            cursor_smoothing: 0.85,
            body_anchor_smoothing: 0.90,
            toggle_window_ms: 2000,
            peace_hold_ms: 300,
            pinch_hold_ms: 300,
            gesture_debounce_ms: 100,
            swipe_threshold: 0.27,
            swipe_cooldown_ms: 500,
            swipe_hand_offset: 0.15,
            task_view_hold_ms: 500,
            task_view_cooldown_ms: 100,
            volume_vertical_threshold: 0.02,
            volume_change_interval_ms: 200,
            volume_step: 2,
        }
    }
}

/// Posture tuning. Ratio tolerances are fractions of the calibrated ratios;
/// height tolerances are frame pixels because the nose baseline is stored in
/// pixel space. The two never mix in a single comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostureConfig {
    /// Keypoints below this score are unreliable.
    pub score_threshold: f64,
    pub distance_tolerance: f64,
    pub slouch_tolerance: f64,
    pub tilt_tolerance: f64,
    pub height_tolerance_px: f64,
    /// Upward nose shift beyond this means the user stood up.
    pub standing_threshold_px: f64,
    /// Continuous bad posture beyond this raises an alert.
    pub bad_posture_duration_ms: u64,
    /// Delay before a raised alert may fire again.
    pub alert_rearm_ms: u64,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.3,
            distance_tolerance: 0.15,
            slouch_tolerance: 0.15,
            tilt_tolerance: 0.05,
            height_tolerance_px: 10.0,
            standing_threshold_px: 50.0,
            bad_posture_duration_ms: 10_000,
            alert_rearm_ms: 5_000,
        }
    }
}

/// Actuator link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Address of the local automation helper.
    pub addr: String,
    pub reconnect_delay_secs: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8765".to_string(),
            reconnect_delay_secs: 3,
        }
    }
}

/// Which gesture features start enabled. All are switchable at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureToggles {
    pub swipe: bool,
    pub volume: bool,
    pub tap: bool,
    pub task_view: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            swipe: true,
            volume: true,
            tap: true,
            task_view: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub posture: PostureConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub features: FeatureToggles,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Frame-loop cadence and session bookkeeping knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Frame step interval while the UI is visible.
    pub visible_interval_ms: u64,
    /// Frame step interval while hidden.
    pub hidden_interval_ms: u64,
    /// Elapsed-display updates pause after this long without a person.
    pub absence_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visible_interval_ms: 33,
            hidden_interval_ms: 1000,
            absence_timeout_ms: 20_000,
        }
    }
}

impl Config {
    /// Read config from a JSON file, falling back to defaults when the file
    /// is absent or unreadable as config.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
