//! Bad-posture accumulation and alerting.
//!
//! A non-good verdict starts an accumulation timer; once the configured
//! duration is exceeded one alert plus one notification fire, then the
//! monitor re-arms after a fixed delay instead of re-triggering every
//! frame. Good/Unknown/Uncalibrated verdicts, a stopped session timer, or
//! an active snooze all clear the accumulation and dismiss the alert.

use serde::{Deserialize, Serialize};

use super::classifier::PostureLabel;
use crate::config::PostureConfig;

/// Payload for a raised alert: on-screen message plus notification text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    pub message: String,
    pub notification_title: String,
    pub notification_body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertSignal {
    Raised(AlertNotice),
    Dismissed,
}

#[derive(Debug)]
pub struct AlertMonitor {
    bad_posture_duration_ms: u64,
    rearm_ms: u64,
    /// None = not accumulating. After a firing this holds a future
    /// timestamp so the next window starts only after the re-arm delay.
    bad_posture_start_ms: Option<u64>,
    alert_visible: bool,
    snooze_until_ms: u64,
}

impl AlertMonitor {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            bad_posture_duration_ms: config.bad_posture_duration_ms,
            rearm_ms: config.alert_rearm_ms,
            bad_posture_start_ms: None,
            alert_visible: false,
            snooze_until_ms: 0,
        }
    }

    pub fn alert_visible(&self) -> bool {
        self.alert_visible
    }

    pub fn is_accumulating(&self) -> bool {
        self.bad_posture_start_ms.is_some()
    }

    /// Suppress alerting until `now_ms + duration_ms`.
    pub fn snooze(&mut self, now_ms: u64, duration_ms: u64) {
        self.snooze_until_ms = now_ms + duration_ms;
    }

    /// Feed one posture verdict. Returns a signal when the visible alert
    /// state should change or a notification should fire.
    pub fn observe(
        &mut self,
        label: PostureLabel,
        timer_running: bool,
        now_ms: u64,
    ) -> Option<AlertSignal> {
        if now_ms < self.snooze_until_ms {
            self.bad_posture_start_ms = None;
            return self.dismiss();
        }

        if !timer_running {
            self.bad_posture_start_ms = None;
            return self.dismiss();
        }

        if label.is_bad() {
            match self.bad_posture_start_ms {
                None => {
                    self.bad_posture_start_ms = Some(now_ms);
                    None
                }
                Some(start) => {
                    if now_ms.saturating_sub(start) > self.bad_posture_duration_ms {
                        self.alert_visible = true;
                        self.bad_posture_start_ms = Some(now_ms + self.rearm_ms);
                        Some(AlertSignal::Raised(AlertNotice {
                            message: format!("Bad posture detected: {}", label.as_str()),
                            notification_title: format!("Bad Posture: {}", label.as_str()),
                            notification_body:
                                "Please sit up straight to match your calibrated pose."
                                    .to_string(),
                        }))
                    } else {
                        None
                    }
                }
            }
        } else {
            self.bad_posture_start_ms = None;
            self.dismiss()
        }
    }

    /// Hide the alert without touching accumulation, e.g. when the user
    /// dismisses or snoozes it from the outside.
    pub fn dismiss(&mut self) -> Option<AlertSignal> {
        if self.alert_visible {
            self.alert_visible = false;
            Some(AlertSignal::Dismissed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> AlertMonitor {
        // 10s accumulation, 5s re-arm.
        AlertMonitor::new(&PostureConfig::default())
    }

    #[test]
    fn test_sustained_bad_posture_raises_exactly_once() {
        let mut m = monitor();
        assert_eq!(m.observe(PostureLabel::Slouching, true, 0), None);
        assert_eq!(m.observe(PostureLabel::Slouching, true, 5_000), None);

        let raised = m.observe(PostureLabel::Slouching, true, 10_001);
        assert!(matches!(raised, Some(AlertSignal::Raised(_))));

        // Frames right after the firing stay quiet during the re-arm delay.
        assert_eq!(m.observe(PostureLabel::Slouching, true, 10_100), None);
        assert_eq!(m.observe(PostureLabel::Slouching, true, 12_000), None);
    }

    #[test]
    fn test_refires_after_rearm_delay() {
        let mut m = monitor();
        m.observe(PostureLabel::Slouching, true, 0);
        assert!(matches!(
            m.observe(PostureLabel::Slouching, true, 10_001),
            Some(AlertSignal::Raised(_))
        ));

        // Second window starts at 15_001 (firing time + 5s re-arm); it
        // fires after another full accumulation period.
        assert_eq!(m.observe(PostureLabel::Slouching, true, 20_000), None);
        assert!(matches!(
            m.observe(PostureLabel::Slouching, true, 25_100),
            Some(AlertSignal::Raised(_))
        ));
    }

    #[test]
    fn test_good_posture_clears_accumulation_and_dismisses() {
        let mut m = monitor();
        m.observe(PostureLabel::Slouching, true, 0);
        assert!(matches!(
            m.observe(PostureLabel::Slouching, true, 10_001),
            Some(AlertSignal::Raised(_))
        ));

        let cleared = m.observe(PostureLabel::GoodPosture, true, 10_500);
        assert_eq!(cleared, Some(AlertSignal::Dismissed));
        assert!(!m.is_accumulating());

        // Accumulation restarts from scratch.
        assert_eq!(m.observe(PostureLabel::Slouching, true, 11_000), None);
        assert_eq!(m.observe(PostureLabel::Slouching, true, 20_000), None);
    }

    #[test]
    fn test_unknown_clears_like_good() {
        let mut m = monitor();
        m.observe(PostureLabel::TooFar, true, 0);
        m.observe(PostureLabel::Unknown, true, 1_000);
        assert!(!m.is_accumulating());
    }

    #[test]
    fn test_stopped_timer_suppresses_alerting() {
        let mut m = monitor();
        m.observe(PostureLabel::Slouching, false, 0);
        assert_eq!(m.observe(PostureLabel::Slouching, false, 60_000), None);
        assert!(!m.is_accumulating());
    }

    #[test]
    fn test_snooze_suppresses_and_dismisses() {
        let mut m = monitor();
        m.observe(PostureLabel::Slouching, true, 0);
        assert!(matches!(
            m.observe(PostureLabel::Slouching, true, 10_001),
            Some(AlertSignal::Raised(_))
        ));

        m.snooze(11_000, 15 * 60 * 1000);
        assert_eq!(
            m.observe(PostureLabel::Slouching, true, 11_001),
            Some(AlertSignal::Dismissed)
        );
        assert_eq!(m.observe(PostureLabel::Slouching, true, 60_000), None);
    }
}
