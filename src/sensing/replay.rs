//! Canned-frame detectors for offline replay and tests.
//!
//! Each `detect` call pops the next recorded frame; an exhausted replay
//! keeps reporting "nothing detected".

use std::collections::VecDeque;

use anyhow::Result;

use crate::landmarks::{HandFrame, PoseFrame};

use super::detector::{HandDetector, PoseDetector};

pub struct ReplayPoseDetector {
    frames: VecDeque<Option<PoseFrame>>,
}

impl ReplayPoseDetector {
    pub fn new(frames: impl IntoIterator<Item = Option<PoseFrame>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl PoseDetector for ReplayPoseDetector {
    async fn detect(&mut self) -> Result<Option<PoseFrame>> {
        Ok(self.frames.pop_front().flatten())
    }
}

pub struct ReplayHandDetector {
    frames: VecDeque<Option<HandFrame>>,
}

impl ReplayHandDetector {
    pub fn new(frames: impl IntoIterator<Item = Option<HandFrame>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl HandDetector for ReplayHandDetector {
    async fn detect(&mut self) -> Result<Option<HandFrame>> {
        Ok(self.frames.pop_front().flatten())
    }
}
