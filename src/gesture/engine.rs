//! The gesture state machine.
//!
//! Consumes one hand frame (plus the latest pose frame for body anchoring
//! and volume gating) per hand-inference step and emits zero or more
//! commands. Several small machines interact here: the activation toggle
//! (Fist then Peace-hold), pointer mapping with torso-drift compensation,
//! pinch/click/drag disambiguation, desktop-switch swipes, the task-view
//! alternation, and volume-by-ear. Cooldowns and the reported-label
//! debounce keep jittery classifier output from turning into repeated
//! actions.

use crate::command::{Command, DragPhase, MouseButton, SwipeDirection, TaskViewAction};
use crate::config::{FeatureToggles, GestureConfig};
use crate::geometry::{clamp01, ema, Point};
use crate::landmarks::{HandFrame, Handedness, KeypointName, PoseFrame};

use super::shapes::{is_fist, is_open_hand, is_peace};
use super::state::{GestureLabel, GestureState, TaskViewArm};
use super::volume;

/// Debounced label plus a short action hint for display.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureStatus {
    pub label: GestureLabel,
    pub hint: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorUpdate {
    Hidden,
    Visible(Point),
}

/// Everything one hand frame produced. Commands go to the actuator; the
/// rest feeds events and the activity feed.
#[derive(Debug, Default)]
pub struct GestureOutput {
    pub commands: Vec<Command>,
    /// Present only when the displayed status should change.
    pub status: Option<GestureStatus>,
    pub cursor: Option<CursorUpdate>,
    pub log: Vec<String>,
    pub volume_level: Option<i32>,
    /// Present when the activation toggle flipped this frame.
    pub activation_changed: Option<bool>,
    /// The hand was too small to trust; the caller should drop its stored
    /// copy.
    pub hand_rejected: bool,
}

pub struct GestureEngine {
    config: GestureConfig,
    features: FeatureToggles,
    /// Keypoints below this score are ignored for anchoring and volume.
    score_threshold: f64,
    state: GestureState,
}

impl GestureEngine {
    pub fn new(config: GestureConfig, features: FeatureToggles, score_threshold: f64) -> Self {
        Self {
            config,
            features,
            score_threshold,
            state: GestureState::new(),
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn features(&self) -> FeatureToggles {
        self.features
    }

    pub fn set_features(&mut self, features: FeatureToggles) {
        self.features = features;
    }

    pub fn is_cursor_active(&self) -> bool {
        self.state.cursor_active
    }

    /// No hand in this inference frame: hide the cursor and drop out of
    /// volume control. Pinch and drag state is intentionally retained so a
    /// momentary tracking dropout does not release a drag.
    pub fn on_hand_lost(&mut self) -> GestureOutput {
        let mut out = GestureOutput::default();
        out.status = Some(GestureStatus {
            label: GestureLabel::None,
            hint: "No action".to_string(),
        });
        out.cursor = Some(CursorUpdate::Hidden);
        self.state.volume_active = false;
        out
    }

    /// Process one hand frame. `pose` is the latest pose result, used for
    /// the body anchor and for volume gating.
    pub fn process(
        &mut self,
        hand: &HandFrame,
        pose: Option<&PoseFrame>,
        now_ms: u64,
    ) -> GestureOutput {
        let mut out = GestureOutput::default();

        // A left/right swap means a different hand in a different place;
        // every spatial reference must be re-established or the pointer
        // would jump.
        if let Some(label) = hand.handedness {
            if let Some(prev) = self.state.active_hand {
                if prev != label {
                    out.log.push(format!(
                        "Hand swapped: {} -> {}, recalibrating references",
                        prev.as_str(),
                        label.as_str()
                    ));
                    self.state.invalidate_spatial_references();
                }
            }
            self.state.active_hand = Some(label);
        }

        // Far-away partial detections produce garbage shapes.
        if hand.hand_size() < self.config.min_hand_size {
            self.state.last_gesture = GestureLabel::None;
            out.status = Some(GestureStatus {
                label: GestureLabel::None,
                hint: "Hand too far, move closer".to_string(),
            });
            out.cursor = Some(CursorUpdate::Hidden);
            out.hand_rejected = true;
            return out;
        }

        let fist = is_fist(hand);
        let peace = is_peace(hand);

        if self.features.volume && !self.state.cursor_active {
            if let Some(pose) = pose {
                volume::detect(
                    &mut self.state,
                    &self.config,
                    self.score_threshold,
                    hand,
                    pose,
                    now_ms,
                    &mut out,
                );
            }
        } else {
            volume::deactivate(&mut self.state, now_ms, &mut out, false);
        }
        // Volume control claims the whole frame while active.
        if self.state.volume_active {
            return out;
        }

        let current_body = self.smoothed_body_anchor(pose);

        self.update_activation_toggle(hand, fist, peace, current_body, now_ms, &mut out);

        if !self.state.cursor_active {
            let shape_label = if fist {
                GestureLabel::Fist
            } else if peace {
                GestureLabel::Peace
            } else {
                GestureLabel::OpenHand
            };
            self.state.last_gesture = shape_label;
            out.status = Some(GestureStatus {
                label: shape_label,
                hint: "Fist then Peace (hold) to activate".to_string(),
            });
            out.cursor = Some(CursorUpdate::Hidden);

            if self.features.swipe && !fist && !peace {
                self.detect_swipe(hand, current_body, now_ms, &mut out);
            }
            if self.features.task_view {
                self.detect_task_view(hand, fist, now_ms, &mut out);
            }
            return out;
        }

        self.track_pointer(hand, peace, current_body, now_ms, &mut out);
        out
    }

    /// Shoulder midpoint, normalized and mirrored, EMA-smoothed to damp
    /// torso sway. Falls back to the activation-time reference when the
    /// shoulders are unreliable.
    fn smoothed_body_anchor(&mut self, pose: Option<&PoseFrame>) -> Point {
        let anchor = pose.and_then(|p| {
            let left = p.reliable(KeypointName::LeftShoulder, self.score_threshold)?;
            let right = p.reliable(KeypointName::RightShoulder, self.score_threshold)?;
            Some(p.frame.normalize(left.position().midpoint(right.position())))
        });

        let mut current = match anchor {
            Some(a) => Point::new(1.0 - a.x, a.y),
            None => self.state.reference_body.unwrap_or(Point::new(0.5, 0.5)),
        };

        match self.state.smooth_body {
            None => self.state.smooth_body = Some(current),
            Some(prev) => {
                let w = self.config.body_anchor_smoothing;
                let smoothed = Point::new(ema(prev.x, current.x, w), ema(prev.y, current.y, w));
                self.state.smooth_body = Some(smoothed);
                current = smoothed;
            }
        }
        current
    }

    /// Fist arms the toggle; Peace held long enough within the arming
    /// window flips activation exactly once. Anything else disarms.
    fn update_activation_toggle(
        &mut self,
        hand: &HandFrame,
        fist: bool,
        peace: bool,
        current_body: Point,
        now_ms: u64,
        out: &mut GestureOutput,
    ) {
        let c = &self.config;
        let within_window =
            now_ms.saturating_sub(self.state.last_toggle_ms) < c.toggle_window_ms;

        if fist && self.state.last_gesture != GestureLabel::Fist {
            self.state.toggle_armed = true;
            self.state.last_toggle_ms = now_ms;
            self.state.peace_hold_start_ms = 0;
        } else if peace && self.state.toggle_armed && within_window {
            if self.state.peace_hold_start_ms == 0 {
                self.state.peace_hold_start_ms = now_ms;
            }
            let held = now_ms - self.state.peace_hold_start_ms;

            if held >= c.peace_hold_ms {
                if self.state.cursor_active {
                    self.state.cursor_active = false;
                    out.activation_changed = Some(false);
                    out.cursor = Some(CursorUpdate::Hidden);
                    out.log.push("Cursor deactivated".to_string());
                } else {
                    self.state.cursor_active = true;
                    self.state.reference_center = Some(hand.pinch_midpoint());
                    self.state.reference_body = Some(current_body);
                    self.state.cursor = Point::new(0.5, 0.5);
                    out.activation_changed = Some(true);
                    out.log.push("Cursor activated".to_string());
                }
                self.state.toggle_armed = false;
                self.state.peace_hold_start_ms = 0;
            }
        } else if !fist && !peace {
            self.state.toggle_armed = false;
            self.state.peace_hold_start_ms = 0;
        }
    }

    /// Desktop-switch swipe, evaluated only while the cursor is inactive
    /// and the hand shows neither Fist nor Peace.
    fn detect_swipe(
        &mut self,
        hand: &HandFrame,
        current_body: Point,
        now_ms: u64,
        out: &mut GestureOutput,
    ) {
        let c = &self.config;

        // Virtual horizontal center: the stored activation reference when
        // one exists, otherwise a body-anchored position offset toward the
        // active hand.
        let (virtual_center_x, body_ref_x) = match self.state.reference_center {
            Some(center) => (
                1.0 - center.x,
                self.state
                    .reference_body
                    .map_or(current_body.x, |b| b.x),
            ),
            None => {
                let body_x = self.state.smooth_body.map_or(0.5, |b| b.x);
                let offset = match self.state.active_hand {
                    Some(Handedness::Right) => -c.swipe_hand_offset,
                    Some(Handedness::Left) => c.swipe_hand_offset,
                    None => 0.0,
                };
                (body_x + offset, current_body.x)
            }
        };

        let raw_x = 1.0 - hand.pinch_midpoint().x;
        let delta_x = (raw_x - virtual_center_x) - (current_body.x - body_ref_x);

        if now_ms.saturating_sub(self.state.last_swipe_ms) > c.swipe_cooldown_ms {
            if delta_x > c.swipe_threshold {
                out.commands.push(Command::SwitchDesktop {
                    direction: SwipeDirection::Right,
                });
                out.log.push("Swipe right: next desktop".to_string());
                out.status = Some(GestureStatus {
                    label: GestureLabel::OpenHand,
                    hint: "Next desktop".to_string(),
                });
                self.state.last_swipe_ms = now_ms;
            } else if delta_x < -c.swipe_threshold {
                out.commands.push(Command::SwitchDesktop {
                    direction: SwipeDirection::Left,
                });
                out.log.push("Swipe left: previous desktop".to_string());
                out.status = Some(GestureStatus {
                    label: GestureLabel::OpenHand,
                    hint: "Previous desktop".to_string(),
                });
                self.state.last_swipe_ms = now_ms;
            }
        }
    }

    /// Two-state alternation: Fist then OpenHand-hold opens task view,
    /// OpenHand then Fist-hold closes it.
    fn detect_task_view(
        &mut self,
        hand: &HandFrame,
        fist: bool,
        now_ms: u64,
        out: &mut GestureOutput,
    ) {
        let c = &self.config;
        let open = is_open_hand(hand);
        let s = &mut self.state;

        if open && s.task_view_arm == Some(TaskViewArm::Fist) {
            if s.open_hand_hold_start_ms == 0 {
                s.open_hand_hold_start_ms = now_ms;
            }
            let held = now_ms - s.open_hand_hold_start_ms;
            if held >= c.task_view_hold_ms
                && now_ms.saturating_sub(s.last_task_view_ms) > c.task_view_cooldown_ms
            {
                out.commands.push(Command::TaskView {
                    action: TaskViewAction::Open,
                });
                out.log
                    .push("Task view opened (fist, then open-hand hold)".to_string());
                s.last_task_view_ms = now_ms;
                s.task_view_arm = None;
                s.open_hand_hold_start_ms = 0;
            }
        } else if fist && s.task_view_arm == Some(TaskViewArm::OpenHand) {
            if s.fist_hold_start_ms == 0 {
                s.fist_hold_start_ms = now_ms;
            }
            let held = now_ms - s.fist_hold_start_ms;
            if held >= c.task_view_hold_ms
                && now_ms.saturating_sub(s.last_task_view_ms) > c.task_view_cooldown_ms
            {
                out.commands.push(Command::TaskView {
                    action: TaskViewAction::Close,
                });
                out.log
                    .push("Task view closed (open hand, then fist hold)".to_string());
                s.last_task_view_ms = now_ms;
                s.task_view_arm = None;
                s.fist_hold_start_ms = 0;
            }
        } else if fist && s.task_view_arm != Some(TaskViewArm::Fist) {
            s.task_view_arm = Some(TaskViewArm::Fist);
            s.open_hand_hold_start_ms = 0;
            s.fist_hold_start_ms = 0;
        } else if open && s.task_view_arm != Some(TaskViewArm::OpenHand) {
            s.task_view_arm = Some(TaskViewArm::OpenHand);
            s.open_hand_hold_start_ms = 0;
            s.fist_hold_start_ms = 0;
        } else if !fist && !open {
            s.task_view_arm = None;
            s.open_hand_hold_start_ms = 0;
            s.fist_hold_start_ms = 0;
        }
    }

    /// Active-cursor path: pointer mapping plus pinch/click/drag.
    fn track_pointer(
        &mut self,
        hand: &HandFrame,
        peace: bool,
        current_body: Point,
        now_ms: u64,
        out: &mut GestureOutput,
    ) {
        let c = self.config.clone();

        let center = match self.state.reference_center {
            Some(center) => center,
            None => {
                let center = hand.pinch_midpoint();
                self.state.reference_center = Some(center);
                self.state.reference_body = Some(current_body);
                out.log
                    .push("Auto-captured pointer reference on first hand frame".to_string());
                center
            }
        };
        if self.state.reference_body.is_none() {
            self.state.reference_body = Some(current_body);
        }
        let body_ref = self.state.reference_body.unwrap_or(current_body);

        let midpoint = hand.pinch_midpoint();
        let raw = Point::new(1.0 - midpoint.x, midpoint.y);
        let virtual_center = Point::new(1.0 - center.x, center.y);

        // Hand delta minus body delta: torso sway does not move the
        // pointer.
        let mut delta_x = (raw.x - virtual_center.x) - (current_body.x - body_ref.x);
        let mut delta_y = (raw.y - virtual_center.y) - (current_body.y - body_ref.y);
        if delta_x.abs() < c.deadzone {
            delta_x = 0.0;
        }
        if delta_y.abs() < c.deadzone {
            delta_y = 0.0;
        }

        let amplified = Point::new(
            clamp01(virtual_center.x + delta_x * c.sensitivity),
            clamp01(virtual_center.y + delta_y * c.sensitivity),
        );

        let pinching = hand.pinch_distance() < c.pinch_distance * 0.6;

        // The cursor freezes while a pinch is forming so the click lands
        // where the user aimed; an active drag keeps following the hand.
        if !pinching || self.state.dragging {
            self.state.cursor = Point::new(
                ema(self.state.cursor.x, amplified.x, c.cursor_smoothing),
                ema(self.state.cursor.y, amplified.y, c.cursor_smoothing),
            );
        }

        out.cursor = Some(CursorUpdate::Visible(self.state.cursor));
        out.commands.push(Command::Move {
            x: self.state.cursor.x,
            y: self.state.cursor.y,
        });

        let mut current = GestureLabel::OpenHand;
        let mut hint = String::from("Move cursor");

        if pinching {
            current = GestureLabel::Pinch;
            if self.state.pinch_start_ms == 0 {
                self.state.pinch_start_ms = now_ms;
            }
            let held = now_ms - self.state.pinch_start_ms;

            if held >= c.pinch_hold_ms {
                hint = "Drag (hold)".to_string();
                if !self.state.dragging {
                    self.state.dragging = true;
                    out.commands.push(Command::Drag {
                        state: DragPhase::Start,
                    });
                    out.log.push("Drag started".to_string());
                }
            } else {
                hint = "Pinch (hold for drag)".to_string();
            }
        } else {
            if peace {
                current = GestureLabel::Peace;
                hint = "Fist then Peace to recalibrate".to_string();
            }

            // Pinch released: a short pinch with no drag is a click.
            if self.state.pinch_start_ms > 0 {
                let held = now_ms - self.state.pinch_start_ms;
                if held < c.pinch_hold_ms && !self.state.dragging && self.features.tap {
                    out.commands.push(Command::Click {
                        button: MouseButton::Left,
                    });
                    out.log.push("Single click".to_string());
                }
                self.state.pinch_start_ms = 0;
            }

            if self.state.dragging {
                self.state.dragging = false;
                out.commands.push(Command::Drag {
                    state: DragPhase::End,
                });
                out.log.push("Drag ended".to_string());
                if !peace {
                    // A drag release skips the label debounce.
                    self.state.last_gesture = current;
                    self.state.last_gesture_change_ms = now_ms;
                    out.status = Some(GestureStatus {
                        label: current,
                        hint: hint.clone(),
                    });
                }
            }
        }

        // Reported-label debounce: the label only changes after the new
        // one has been observed continuously for the debounce window.
        if current != self.state.last_gesture {
            if now_ms.saturating_sub(self.state.last_gesture_change_ms) > c.gesture_debounce_ms {
                self.state.last_gesture = current;
                self.state.last_gesture_change_ms = now_ms;
                out.status = Some(GestureStatus {
                    label: current,
                    hint,
                });
            }
        } else {
            self.state.last_gesture_change_ms = now_ms;
            out.status = Some(GestureStatus {
                label: current,
                hint,
            });
        }
    }
}
