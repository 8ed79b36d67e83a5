//! Volume control by holding the index finger at an ear.
//!
//! Requires simultaneous hand landmarks and pose keypoints. The gesture
//! activates when the index tip is within the ear-touch distance of the
//! nearer reliable ear while the middle tip is not (a whole hand resting
//! on the head is ignored). While active, vertical offset from the ear
//! steps the volume, rate-limited to one change per interval.

use crate::command::{Command, VolumeDirection};
use crate::config::GestureConfig;
use crate::geometry::{distance, Point};
use crate::landmarks::{HandFrame, HandLandmarkId, KeypointName, PoseFrame};

use super::engine::{GestureOutput, GestureStatus};
use super::state::{GestureLabel, GestureState};

/// Index-finger deactivations shorter than this are not worth a log line.
const LOG_WORTHY_ACTIVE_MS: u64 = 1000;

pub(crate) fn detect(
    state: &mut GestureState,
    config: &GestureConfig,
    score_threshold: f64,
    hand: &HandFrame,
    pose: &PoseFrame,
    now_ms: u64,
    out: &mut GestureOutput,
) {
    let index_tip = hand.get(HandLandmarkId::IndexTip);

    // Nearer reliable ear, in normalized coordinates.
    let mut closest: Option<(Point, f64)> = None;
    for name in [KeypointName::LeftEar, KeypointName::RightEar] {
        if let Some(kp) = pose.reliable(name, score_threshold) {
            let ear = pose.frame.normalize(kp.position());
            let dist = distance(index_tip, ear);
            if closest.map_or(true, |(_, best)| dist < best) {
                closest = Some((ear, dist));
            }
        }
    }

    let Some((ear, ear_dist)) = closest else {
        deactivate(state, now_ms, out, false);
        return;
    };

    if ear_dist >= config.ear_touch_distance {
        deactivate(state, now_ms, out, true);
        return;
    }

    // Middle finger also at the ear means the hand is resting on the head.
    let middle_dist = distance(hand.get(HandLandmarkId::MiddleTip), ear);
    if middle_dist < config.ear_touch_distance {
        deactivate(state, now_ms, out, false);
        return;
    }

    if !state.volume_active {
        state.volume_active = true;
        state.volume_start_ms = now_ms;
        out.log
            .push("Volume control activated - position finger above/below ear".to_string());
        out.status = Some(GestureStatus {
            label: GestureLabel::VolumeControl,
            hint: "Position above/below ear".to_string(),
        });
    }

    let ready = now_ms.saturating_sub(state.last_volume_ms) > config.volume_change_interval_ms;

    if index_tip.y < ear.y - config.volume_vertical_threshold {
        if ready {
            out.commands.push(Command::Volume {
                direction: VolumeDirection::Up,
            });
            state.volume_level = (state.volume_level + config.volume_step).min(100);
            state.last_volume_ms = now_ms;
            out.volume_level = Some(state.volume_level);
            out.log
                .push(format!("Volume increased to {}%", state.volume_level));
            out.status = Some(GestureStatus {
                label: GestureLabel::VolumeControl,
                hint: format!("Volume: {}% up", state.volume_level),
            });
        }
    } else if index_tip.y > ear.y + config.volume_vertical_threshold {
        if ready {
            out.commands.push(Command::Volume {
                direction: VolumeDirection::Down,
            });
            state.volume_level = (state.volume_level - config.volume_step).max(0);
            state.last_volume_ms = now_ms;
            out.volume_level = Some(state.volume_level);
            out.log
                .push(format!("Volume decreased to {}%", state.volume_level));
            out.status = Some(GestureStatus {
                label: GestureLabel::VolumeControl,
                hint: format!("Volume: {}% down", state.volume_level),
            });
        }
    } else {
        out.status = Some(GestureStatus {
            label: GestureLabel::VolumeControl,
            hint: "Hold position at ear level".to_string(),
        });
    }
}

/// Drop out of volume control. `log_long` notes the deactivation in the
/// activity feed when the control was held long enough to matter.
pub(crate) fn deactivate(
    state: &mut GestureState,
    now_ms: u64,
    out: &mut GestureOutput,
    log_long: bool,
) {
    if state.volume_active {
        if log_long && now_ms.saturating_sub(state.volume_start_ms) > LOG_WORTHY_ACTIVE_MS {
            out.log.push("Volume control deactivated".to_string());
        }
        state.volume_active = false;
    }
}
