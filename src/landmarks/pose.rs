//! Body pose keypoints as delivered by an external pose model.
//!
//! Keypoints arrive fresh every pose-inference frame and are never mutated,
//! only superseded. Lookup is by a closed enum rather than by string name so
//! a malformed frame is rejected at construction instead of failing deep in
//! the classifiers.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// The 17 body landmarks produced by the pose model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

pub const KEYPOINT_COUNT: usize = 17;

impl KeypointName {
    pub const ALL: [KeypointName; KEYPOINT_COUNT] = [
        KeypointName::Nose,
        KeypointName::LeftEye,
        KeypointName::RightEye,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Wire name as emitted by the pose model.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        KeypointName::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

/// One named body landmark: position in frame pixels plus model confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl Keypoint {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Pixel dimensions of the camera frame the keypoints were measured in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    /// Map a pixel-space point into [0,1] coordinates.
    pub fn normalize(&self, p: Point) -> Point {
        Point::new(p.x / self.width, p.y / self.height)
    }
}

/// One pose-inference result: every keypoint present exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    keypoints: [Keypoint; KEYPOINT_COUNT],
    pub frame: FrameSize,
}

impl PoseFrame {
    /// Build a frame from a model output list. Every one of the 17 keypoints
    /// must appear exactly once; duplicates and gaps are rejected.
    pub fn from_keypoints(keypoints: Vec<Keypoint>, frame: FrameSize) -> Result<Self> {
        if frame.width <= 0.0 || frame.height <= 0.0 {
            bail!("invalid frame dimensions {}x{}", frame.width, frame.height);
        }

        let mut slots: [Option<Keypoint>; KEYPOINT_COUNT] = [None; KEYPOINT_COUNT];
        for kp in keypoints {
            let idx = kp.name.index();
            if slots[idx].is_some() {
                bail!("duplicate keypoint {}", kp.name.as_str());
            }
            slots[idx] = Some(kp);
        }

        let mut out = [Keypoint {
            name: KeypointName::Nose,
            x: 0.0,
            y: 0.0,
            score: 0.0,
        }; KEYPOINT_COUNT];
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(kp) => out[idx] = kp,
                None => bail!("missing keypoint {}", KeypointName::ALL[idx].as_str()),
            }
        }

        Ok(Self {
            keypoints: out,
            frame,
        })
    }

    pub fn get(&self, name: KeypointName) -> &Keypoint {
        &self.keypoints[name.index()]
    }

    /// The keypoint only when its score clears the reliability threshold.
    pub fn reliable(&self, name: KeypointName, score_threshold: f64) -> Option<&Keypoint> {
        let kp = self.get(name);
        (kp.score > score_threshold).then_some(kp)
    }

    pub fn all_reliable(&self, names: &[KeypointName], score_threshold: f64) -> bool {
        names
            .iter()
            .all(|name| self.get(*name).score > score_threshold)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A frame with every keypoint at the given score and a simple seated
    /// geometry: shoulders 100 px apart, ears above them, nose centered.
    pub fn seated_pose(score: f64) -> PoseFrame {
        pose_with(score, 270.0, 370.0, 240.0, 200.0)
    }

    pub fn pose_with(
        score: f64,
        left_shoulder_x: f64,
        right_shoulder_x: f64,
        shoulder_y: f64,
        nose_y: f64,
    ) -> PoseFrame {
        let keypoints = KeypointName::ALL
            .iter()
            .map(|&name| {
                let (x, y) = match name {
                    KeypointName::Nose => (320.0, nose_y),
                    KeypointName::LeftEar => (290.0, nose_y + 10.0),
                    KeypointName::RightEar => (350.0, nose_y + 10.0),
                    KeypointName::LeftShoulder => (left_shoulder_x, shoulder_y),
                    KeypointName::RightShoulder => (right_shoulder_x, shoulder_y),
                    _ => (320.0, 400.0),
                };
                Keypoint { name, x, y, score }
            })
            .collect();
        PoseFrame::from_keypoints(keypoints, FrameSize { width: 640.0, height: 480.0 }).unwrap()
    }
}
