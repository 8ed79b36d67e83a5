//! Engine lifecycle and the external control surface.
//!
//! `Engine::start` spawns the frame loop and the actuator link;
//! `EngineHandle` is the cheap cloneable API handed to the embedding
//! process (calibration trigger, timer control, feature toggles, snooze,
//! visibility). Control calls are applied by the loop task between frame
//! steps, so no state is ever touched from two places.

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::actuator::ActuatorLink;
use crate::config::{Config, FeatureToggles};
use crate::events::EngineEvent;
use crate::posture::CalibrationProfile;

use super::detector::{HandDetector, PoseDetector};
use super::loop_worker::{frame_loop, FrameEngine};

pub(crate) enum ControlMsg {
    Calibrate {
        reply: oneshot::Sender<Result<CalibrationProfile>>,
    },
    TimerStart,
    TimerStop,
    TimerReset,
    SetFeatures(FeatureToggles),
    Snooze { duration_ms: u64 },
    SetVisible(bool),
}

pub struct Engine {
    handle: EngineHandle,
    loop_task: JoinHandle<()>,
    link: ActuatorLink,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct EngineHandle {
    control: mpsc::UnboundedSender<ControlMsg>,
}

impl Engine {
    /// Spawn the engine. Pass `None` for a detector whose model failed to
    /// initialize; the corresponding feature stays disabled for the
    /// process lifetime while everything else runs.
    pub fn start<P, H>(
        config: Config,
        pose_detector: Option<P>,
        hand_detector: Option<H>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>)
    where
        P: PoseDetector,
        H: HandDetector,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let link = ActuatorLink::spawn(config.link.clone(), events_tx.clone(), cancel.clone());
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let engine = FrameEngine::new(config, link.handle(), events_tx);
        let loop_task = tokio::spawn(frame_loop(
            engine,
            pose_detector,
            hand_detector,
            control_rx,
            cancel.clone(),
        ));

        (
            Self {
                handle: EngineHandle {
                    control: control_tx,
                },
                loop_task,
                link,
                cancel,
            },
            events_rx,
        )
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop scheduling future frame steps and wait for in-flight work to
    /// finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.loop_task.await;
        self.link.join().await;
    }
}

impl EngineHandle {
    /// User-initiated calibration against the latest pose frame. Fails,
    /// storing nothing, when the required keypoints are not reliable.
    pub async fn calibrate(&self) -> Result<CalibrationProfile> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control
            .send(ControlMsg::Calibrate { reply: reply_tx })
            .map_err(|_| anyhow!("engine stopped"))?;
        reply_rx
            .await
            .context("engine dropped the calibration request")?
    }

    pub fn start_timer(&self) {
        let _ = self.control.send(ControlMsg::TimerStart);
    }

    pub fn stop_timer(&self) {
        let _ = self.control.send(ControlMsg::TimerStop);
    }

    pub fn reset_timer(&self) {
        let _ = self.control.send(ControlMsg::TimerReset);
    }

    pub fn set_features(&self, features: FeatureToggles) {
        let _ = self.control.send(ControlMsg::SetFeatures(features));
    }

    /// Suppress posture alerts for the given duration.
    pub fn snooze_alerts(&self, duration_ms: u64) {
        let _ = self.control.send(ControlMsg::Snooze { duration_ms });
    }

    /// Switch the frame cadence between the fast visible interval and the
    /// slow hidden one.
    pub fn set_visible(&self, visible: bool) {
        let _ = self.control.send(ControlMsg::SetVisible(visible));
    }
}
