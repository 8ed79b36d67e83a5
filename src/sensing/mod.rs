pub mod controller;
pub mod detector;
mod loop_worker;
pub mod replay;

pub use controller::{Engine, EngineHandle};
pub use detector::{HandDetector, PoseDetector};
pub use replay::{ReplayHandDetector, ReplayPoseDetector};
