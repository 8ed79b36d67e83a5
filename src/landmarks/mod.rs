pub mod hand;
pub mod pose;

pub use hand::{HandFrame, HandLandmarkId, Handedness, HAND_LANDMARK_COUNT};
pub use pose::{FrameSize, Keypoint, KeypointName, PoseFrame, KEYPOINT_COUNT};
