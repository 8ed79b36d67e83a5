//! The frame loop: the single logical flow that owns all session state.
//!
//! A frame interval alternates pose and hand inference so per-frame cost
//! stays bounded; at most one inference of each kind is outstanding, and
//! all state mutation and command emission happen synchronously once a
//! result is available. A separate one-second interval drives the session
//! timer. Cancellation stops the scheduling of future steps; a step in
//! flight completes normally and the loop then exits.

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::actuator::ActuatorHandle;
use crate::activity::ActivityFeed;
use crate::command::Command;
use crate::config::Config;
use crate::events::EngineEvent;
use crate::gesture::{CursorUpdate, GestureEngine, GestureOutput};
use crate::landmarks::{HandFrame, KeypointName, PoseFrame};
use crate::posture::{
    AlertMonitor, AlertSignal, PostureClassifier, PostureLabel, PostureVerdict,
    StandingTransition,
};
use crate::timer::TimerState;

use super::controller::ControlMsg;
use super::detector::{HandDetector, PoseDetector};

/// All mutable session state, owned by the loop task and touched by
/// exactly one logical flow at a time. No locking required.
pub(crate) struct FrameEngine {
    pub(crate) config: Config,
    classifier: PostureClassifier,
    alert: AlertMonitor,
    gestures: GestureEngine,
    timer: TimerState,
    activity: ActivityFeed,
    /// Latest pose result, kept for the gesture body anchor and for
    /// calibration requests.
    last_pose: Option<PoseFrame>,
    last_verdict: PostureVerdict,
    last_person_ms: u64,
    actuator: ActuatorHandle,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl FrameEngine {
    pub(crate) fn new(
        config: Config,
        actuator: ActuatorHandle,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        let classifier = PostureClassifier::new(config.posture.clone());
        let alert = AlertMonitor::new(&config.posture);
        let gestures = GestureEngine::new(
            config.gesture.clone(),
            config.features,
            config.posture.score_threshold,
        );
        Self {
            config,
            classifier,
            alert,
            gestures,
            timer: TimerState::new(),
            activity: ActivityFeed::new(),
            last_pose: None,
            last_verdict: PostureVerdict {
                label: PostureLabel::Unknown,
                confidence: 0,
            },
            last_person_ms: 0,
            actuator,
            events,
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let entry = self.activity.push(message);
        let _ = self.events.send(EngineEvent::Activity(entry));
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        for command in commands {
            if !command.is_move() {
                self.log(command.describe());
            }
            self.actuator.send(command);
        }
    }

    /// Consume one pose-inference result.
    pub(crate) fn handle_pose_result(&mut self, pose: Option<PoseFrame>, now_ms: u64) {
        let threshold = self.config.posture.score_threshold;
        let person_present = pose.as_ref().map_or(false, |p| {
            KeypointName::ALL.iter().any(|&n| p.get(n).score > threshold)
        });
        if person_present {
            self.last_person_ms = now_ms;
        }

        let classification = self.classifier.classify(pose.as_ref());
        match classification.standing_transition {
            Some(StandingTransition::StoodUp) => self.log("User stood up"),
            Some(StandingTransition::SatDown) => self.log("User sat down"),
            None => {}
        }

        let verdict = classification.verdict;
        if verdict != self.last_verdict {
            self.emit(EngineEvent::PostureChanged {
                label: verdict.label,
                confidence: verdict.confidence,
            });
        }
        self.last_verdict = verdict;

        match self
            .alert
            .observe(verdict.label, self.timer.is_running(), now_ms)
        {
            Some(AlertSignal::Raised(notice)) => {
                self.log(notice.message.clone());
                self.emit(EngineEvent::AlertRaised(notice));
            }
            Some(AlertSignal::Dismissed) => self.emit(EngineEvent::AlertDismissed),
            None => {}
        }

        self.last_pose = pose;
    }

    /// Consume one hand-inference result.
    pub(crate) fn handle_hand_result(&mut self, hand: Option<HandFrame>, now_ms: u64) {
        let out = match hand {
            Some(hand) => self
                .gestures
                .process(&hand, self.last_pose.as_ref(), now_ms),
            None => self.gestures.on_hand_lost(),
        };
        self.apply_gesture_output(out);
    }

    fn apply_gesture_output(&mut self, out: GestureOutput) {
        for line in out.log {
            self.log(line);
        }
        if let Some(active) = out.activation_changed {
            self.emit(EngineEvent::ActivationChanged { active });
        }
        if let Some(status) = out.status {
            self.emit(EngineEvent::GestureStatus {
                label: status.label,
                hint: status.hint,
            });
        }
        match out.cursor {
            Some(CursorUpdate::Visible(p)) => self.emit(EngineEvent::CursorMoved { x: p.x, y: p.y }),
            Some(CursorUpdate::Hidden) => self.emit(EngineEvent::CursorHidden),
            None => {}
        }
        if let Some(level) = out.volume_level {
            self.emit(EngineEvent::VolumeChanged { level });
        }
        self.dispatch(out.commands);
    }

    /// Per-second timer tick. Accounting always runs; the display event is
    /// suppressed while nobody has been seen for the absence timeout.
    pub(crate) fn timer_tick(&mut self, now_ms: u64) {
        self.timer
            .tick(now_ms, self.last_verdict.label == PostureLabel::GoodPosture);

        let absent =
            now_ms.saturating_sub(self.last_person_ms) >= self.config.engine.absence_timeout_ms;
        if self.timer.is_running() && !absent {
            self.emit(EngineEvent::TimerTick(self.timer.snapshot(now_ms)));
        }
    }

    /// External API calls, applied between frame steps. Returns a new
    /// frame cadence when visibility changed.
    pub(crate) fn handle_control(&mut self, msg: ControlMsg, now_ms: u64) -> Option<Duration> {
        match msg {
            ControlMsg::Calibrate { reply } => {
                let result = match self.last_pose.clone() {
                    Some(pose) => self.classifier.calibrate(&pose),
                    None => Err(anyhow::anyhow!(
                        "no person detected, sit in front of the camera"
                    )),
                };
                match &result {
                    Ok(_) => {
                        self.log("Posture calibrated");
                        self.emit(EngineEvent::PostureChanged {
                            label: PostureLabel::GoodPosture,
                            confidence: 100,
                        });
                    }
                    Err(err) => self.log(format!("Calibration failed: {err}")),
                }
                let _ = reply.send(result);
                None
            }
            ControlMsg::TimerStart => {
                if self.timer.start(now_ms) {
                    self.log("Timer started manually");
                }
                self.emit(EngineEvent::TimerChanged(self.timer.snapshot(now_ms)));
                None
            }
            ControlMsg::TimerStop => {
                if self.timer.stop(now_ms) {
                    self.log("Timer stopped manually");
                }
                self.emit(EngineEvent::TimerChanged(self.timer.snapshot(now_ms)));
                None
            }
            ControlMsg::TimerReset => {
                self.timer.reset(now_ms);
                self.log("Timer reset");
                self.emit(EngineEvent::TimerChanged(self.timer.snapshot(now_ms)));
                None
            }
            ControlMsg::SetFeatures(features) => {
                self.gestures.set_features(features);
                None
            }
            ControlMsg::Snooze { duration_ms } => {
                self.alert.snooze(now_ms, duration_ms);
                if let Some(AlertSignal::Dismissed) = self.alert.dismiss() {
                    self.emit(EngineEvent::AlertDismissed);
                }
                self.log(format!("Alerts snoozed for {}s", duration_ms / 1000));
                None
            }
            ControlMsg::SetVisible(visible) => {
                let interval_ms = if visible {
                    self.config.engine.visible_interval_ms
                } else {
                    self.config.engine.hidden_interval_ms
                };
                Some(Duration::from_millis(interval_ms))
            }
        }
    }
}

pub(crate) async fn frame_loop<P, H>(
    mut engine: FrameEngine,
    mut pose_detector: Option<P>,
    mut hand_detector: Option<H>,
    mut control_rx: mpsc::UnboundedReceiver<ControlMsg>,
    cancel: CancellationToken,
) where
    P: PoseDetector,
    H: HandDetector,
{
    // Model unavailability disables the corresponding feature for the
    // process lifetime; everything else keeps running.
    if pose_detector.is_none() {
        warn!("Pose model unavailable, posture tracking disabled");
    }
    if hand_detector.is_none() {
        warn!("Hand model unavailable, gesture control disabled");
    }

    let epoch = Instant::now();

    let mut frames = interval(Duration::from_millis(engine.config.engine.visible_interval_ms));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seconds = interval(Duration::from_secs(1));
    seconds.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut frame_counter: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Frame loop shutting down");
                break;
            }
            _ = frames.tick() => {
                frame_counter = frame_counter.wrapping_add(1);
                if frame_counter % 2 == 0 {
                    if let Some(detector) = pose_detector.as_mut() {
                        match detector.detect().await {
                            Ok(pose) => {
                                let now_ms = epoch.elapsed().as_millis() as u64;
                                engine.handle_pose_result(pose, now_ms);
                            }
                            Err(err) => error!("Pose inference failed: {err:?}"),
                        }
                    }
                } else if let Some(detector) = hand_detector.as_mut() {
                    match detector.detect().await {
                        Ok(hand) => {
                            let now_ms = epoch.elapsed().as_millis() as u64;
                            engine.handle_hand_result(hand, now_ms);
                        }
                        Err(err) => error!("Hand inference failed: {err:?}"),
                    }
                }
            }
            _ = seconds.tick() => {
                engine.timer_tick(epoch.elapsed().as_millis() as u64);
            }
            msg = control_rx.recv() => {
                match msg {
                    Some(msg) => {
                        let now_ms = epoch.elapsed().as_millis() as u64;
                        if let Some(new_cadence) = engine.handle_control(msg, now_ms) {
                            frames = interval(new_cadence);
                            frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::pose::test_support::seated_pose;
    use tokio::sync::oneshot;

    fn engine_with_channels() -> (
        FrameEngine,
        mpsc::UnboundedReceiver<Command>,
        mpsc::UnboundedReceiver<EngineEvent>,
    ) {
        let (actuator, commands_rx) = ActuatorHandle::for_tests();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            FrameEngine::new(Config::default(), actuator, events_tx),
            commands_rx,
            events_rx,
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn test_calibrate_without_person_is_rejected() {
        let (mut engine, _commands, _events) = engine_with_channels();
        let (reply_tx, mut reply_rx) = oneshot::channel();
        engine.handle_control(ControlMsg::Calibrate { reply: reply_tx }, 1_000);
        assert!(reply_rx.try_recv().unwrap().is_err());
    }

    #[test]
    fn test_calibrate_uses_latest_pose() {
        let (mut engine, _commands, mut events) = engine_with_channels();
        engine.handle_pose_result(Some(seated_pose(0.9)), 500);
        drain(&mut events);

        let (reply_tx, mut reply_rx) = oneshot::channel();
        engine.handle_control(ControlMsg::Calibrate { reply: reply_tx }, 1_000);
        let profile = reply_rx.try_recv().unwrap().unwrap();
        assert!((profile.shoulder_width - 100.0).abs() < 1e-9);

        let posture_events: Vec<_> = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::PostureChanged { .. }))
            .collect();
        assert!(!posture_events.is_empty());
    }

    #[test]
    fn test_posture_event_emitted_on_change_only() {
        let (mut engine, _commands, mut events) = engine_with_channels();

        engine.handle_pose_result(Some(seated_pose(0.9)), 100);
        let first = drain(&mut events);
        assert!(first
            .iter()
            .any(|e| matches!(e, EngineEvent::PostureChanged { .. })));

        // Identical verdict on the next frame: no repeat event.
        engine.handle_pose_result(Some(seated_pose(0.9)), 200);
        let second = drain(&mut events);
        assert!(!second
            .iter()
            .any(|e| matches!(e, EngineEvent::PostureChanged { .. })));
    }

    #[test]
    fn test_sustained_bad_posture_raises_alert_while_timer_runs() {
        let (mut engine, _commands, mut events) = engine_with_channels();
        engine.handle_pose_result(Some(seated_pose(0.9)), 100);
        let (reply_tx, _reply_rx) = oneshot::channel();
        engine.handle_control(ControlMsg::Calibrate { reply: reply_tx }, 150);
        engine.handle_control(ControlMsg::TimerStart, 200);
        drain(&mut events);

        // Shoulders 70 px apart reads as TooFar against the 100 px
        // calibration.
        let too_far = crate::landmarks::pose::test_support::pose_with(
            0.9, 285.0, 355.0, 240.0, 200.0,
        );
        engine.handle_pose_result(Some(too_far.clone()), 1_000);
        engine.handle_pose_result(Some(too_far.clone()), 6_000);
        engine.handle_pose_result(Some(too_far.clone()), 11_100);

        let raised: Vec<_> = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::AlertRaised(_)))
            .collect();
        assert_eq!(raised.len(), 1);

        // Recovery dismisses the alert.
        engine.handle_pose_result(Some(seated_pose(0.9)), 11_200);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, EngineEvent::AlertDismissed)));
    }

    #[test]
    fn test_timer_tick_suppressed_while_absent() {
        let (mut engine, _commands, mut events) = engine_with_channels();
        engine.handle_control(ControlMsg::TimerStart, 0);
        engine.handle_pose_result(Some(seated_pose(0.9)), 100);
        drain(&mut events);

        engine.timer_tick(1_000);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, EngineEvent::TimerTick(_))));

        // 20s without a person: accounting continues, display does not.
        engine.timer_tick(25_000);
        assert!(!drain(&mut events)
            .iter()
            .any(|e| matches!(e, EngineEvent::TimerTick(_))));
    }

    #[test]
    fn test_non_move_commands_are_logged_moves_are_not() {
        let (mut engine, mut commands, mut events) = engine_with_channels();
        engine.dispatch(vec![
            Command::Move { x: 0.5, y: 0.5 },
            Command::Click {
                button: crate::command::MouseButton::Left,
            },
        ]);

        assert!(commands.try_recv().is_ok());
        assert!(commands.try_recv().is_ok());

        let activity: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Activity(entry) => Some(entry.message),
                _ => None,
            })
            .collect();
        assert_eq!(activity.len(), 1);
        assert!(activity[0].contains("click"));
    }

    #[test]
    fn test_visibility_switch_changes_cadence() {
        let (mut engine, _commands, _events) = engine_with_channels();
        let hidden = engine.handle_control(ControlMsg::SetVisible(false), 0);
        assert_eq!(hidden, Some(Duration::from_millis(1000)));
        let visible = engine.handle_control(ControlMsg::SetVisible(true), 0);
        assert_eq!(visible, Some(Duration::from_millis(33)));
    }

    #[test]
    fn test_timer_controls_log_and_emit() {
        let (mut engine, _commands, mut events) = engine_with_channels();
        engine.handle_control(ControlMsg::TimerStart, 1_000);
        engine.handle_control(ControlMsg::TimerStop, 2_000);
        engine.handle_control(ControlMsg::TimerReset, 3_000);

        let all = drain(&mut events);
        let changed: Vec<_> = all
            .iter()
            .filter(|e| matches!(e, EngineEvent::TimerChanged(_)))
            .collect();
        assert_eq!(changed.len(), 3);

        let logs: Vec<_> = all
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Activity(entry) => Some(entry.message.as_str()),
                _ => None,
            })
            .collect();
        assert!(logs.iter().any(|m| m.contains("Timer started")));
        assert!(logs.iter().any(|m| m.contains("Timer stopped")));
        assert!(logs.iter().any(|m| m.contains("Timer reset")));
    }
}
