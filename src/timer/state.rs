//! Manual session timer with good-posture accounting.
//!
//! Start/stop/reset are the only control paths; nothing starts or stops the
//! timer automatically. A per-second tick advances the elapsed display and,
//! while the latest posture verdict is good, the good-posture accumulator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Break hint derived from elapsed session time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Fresh,
    ConsiderBreak,
    StandUp,
}

const CONSIDER_BREAK_MS: u64 = 30 * 60 * 1000;
const STAND_UP_MS: u64 = 60 * 60 * 1000;

impl SessionPhase {
    pub fn from_elapsed_ms(elapsed_ms: u64) -> Self {
        if elapsed_ms > STAND_UP_MS {
            SessionPhase::StandUp
        } else if elapsed_ms > CONSIDER_BREAK_MS {
            SessionPhase::ConsiderBreak
        } else {
            SessionPhase::Fresh
        }
    }
}

/// Point-in-time view of the timer for event consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub running: bool,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
    pub good_posture_ms: u64,
    pub phase: SessionPhase,
}

#[derive(Debug, Clone)]
pub struct TimerState {
    running: bool,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    /// Monotonic ms; adjusted on start so pauses don't count.
    session_start_ms: u64,
    paused_accum_ms: u64,
    good_posture_ms: u64,
    last_tick_ms: u64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            session_id: None,
            started_at: None,
            session_start_ms: 0,
            paused_accum_ms: 0,
            good_posture_ms: 0,
            last_tick_ms: 0,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Elapsed session time; frozen at the pause point while stopped.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        if self.running {
            now_ms.saturating_sub(self.session_start_ms)
        } else {
            self.paused_accum_ms
        }
    }

    pub fn good_posture_ms(&self) -> u64 {
        self.good_posture_ms
    }

    /// Start (or resume) the session. No-op while already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.session_start_ms = now_ms - self.paused_accum_ms;
        self.paused_accum_ms = 0;
        self.last_tick_ms = now_ms;
        if self.session_id.is_none() {
            self.session_id = Some(Uuid::new_v4().to_string());
            self.started_at = Some(Utc::now());
        }
        true
    }

    /// Stop the session, retaining elapsed time for a later resume.
    /// No-op while already stopped.
    pub fn stop(&mut self, now_ms: u64) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.paused_accum_ms = now_ms.saturating_sub(self.session_start_ms);
        true
    }

    /// Zero everything and leave the timer stopped.
    pub fn reset(&mut self, now_ms: u64) {
        self.running = false;
        self.session_id = None;
        self.started_at = None;
        self.session_start_ms = now_ms;
        self.paused_accum_ms = 0;
        self.good_posture_ms = 0;
        self.last_tick_ms = now_ms;
    }

    /// Per-second tick: advances good-posture accounting by the real
    /// wall-clock delta since the previous tick when the latest verdict is
    /// good. No-op while stopped.
    pub fn tick(&mut self, now_ms: u64, posture_is_good: bool) {
        if !self.running {
            return;
        }
        if posture_is_good {
            self.good_posture_ms += now_ms.saturating_sub(self.last_tick_ms);
        }
        self.last_tick_ms = now_ms;
    }

    pub fn snapshot(&self, now_ms: u64) -> TimerSnapshot {
        let elapsed_ms = self.elapsed_ms(now_ms);
        TimerSnapshot {
            running: self.running,
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            elapsed_ms,
            good_posture_ms: self.good_posture_ms,
            phase: SessionPhase::from_elapsed_ms(elapsed_ms),
        }
    }
}
