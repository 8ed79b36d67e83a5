//! Camera gestures and posture coaching for the desktop.
//!
//! The inference core: noisy per-frame pose keypoints and hand landmarks
//! go in, debounced commands for a desktop automation helper and posture
//! verdicts with alerting come out. Video capture, model inference, window
//! chrome, and notification delivery live in external collaborators; this
//! crate owns the state machines in between.

pub mod activity;
pub mod actuator;
pub mod command;
pub mod config;
pub mod events;
pub mod geometry;
pub mod gesture;
pub mod landmarks;
pub mod posture;
pub mod sensing;
pub mod timer;

pub use command::Command;
pub use config::Config;
pub use events::EngineEvent;
pub use sensing::{Engine, EngineHandle, HandDetector, PoseDetector};
