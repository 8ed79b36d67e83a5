pub mod state;

pub use state::{SessionPhase, TimerSnapshot, TimerState};
