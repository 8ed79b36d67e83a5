//! Hand landmarks as delivered by an external hand model.
//!
//! Models the 21 fixed points of a tracked hand, normalized to [0,1].
//! A frame is absent entirely when no hand is detected; partial sets are
//! rejected at construction.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// The 21 hand landmarks, indexed by anatomical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmarkId {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

pub const HAND_LANDMARK_COUNT: usize = 21;

impl HandLandmarkId {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Which hand the model believes it is tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// One hand-inference result: all 21 points plus an optional handedness
/// label. Superseded each hand-inference frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    points: [Point; HAND_LANDMARK_COUNT],
    pub handedness: Option<Handedness>,
}

impl HandFrame {
    pub fn from_points(points: Vec<Point>, handedness: Option<Handedness>) -> Result<Self> {
        if points.len() != HAND_LANDMARK_COUNT {
            bail!(
                "expected {} hand landmarks, got {}",
                HAND_LANDMARK_COUNT,
                points.len()
            );
        }
        let mut out = [Point::default(); HAND_LANDMARK_COUNT];
        out.copy_from_slice(&points);
        Ok(Self {
            points: out,
            handedness,
        })
    }

    pub fn get(&self, id: HandLandmarkId) -> Point {
        self.points[id.index()]
    }

    /// Distance from wrist to middle fingertip, a proxy for apparent hand
    /// size (and therefore distance from the camera).
    pub fn hand_size(&self) -> f64 {
        self.get(HandLandmarkId::MiddleTip)
            .distance_to(self.get(HandLandmarkId::Wrist))
    }

    /// Midpoint of index tip and thumb tip, the pointer anchor.
    pub fn pinch_midpoint(&self) -> Point {
        self.get(HandLandmarkId::IndexTip)
            .midpoint(self.get(HandLandmarkId::ThumbTip))
    }

    pub fn pinch_distance(&self) -> f64 {
        self.get(HandLandmarkId::IndexTip)
            .distance_to(self.get(HandLandmarkId::ThumbTip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_rejects_short_set() {
        let points = vec![Point::default(); 20];
        assert!(HandFrame::from_points(points, None).is_err());
    }

    #[test]
    fn test_indices_match_anatomical_order() {
        assert_eq!(HandLandmarkId::Wrist.index(), 0);
        assert_eq!(HandLandmarkId::ThumbTip.index(), 4);
        assert_eq!(HandLandmarkId::IndexTip.index(), 8);
        assert_eq!(HandLandmarkId::MiddleTip.index(), 12);
        assert_eq!(HandLandmarkId::RingTip.index(), 16);
        assert_eq!(HandLandmarkId::PinkyTip.index(), 20);
    }

    #[test]
    fn test_hand_size() {
        let mut points = vec![Point::default(); HAND_LANDMARK_COUNT];
        points[HandLandmarkId::MiddleTip.index()] = Point::new(0.3, 0.4);
        let frame = HandFrame::from_points(points, None).unwrap();
        assert!((frame.hand_size() - 0.5).abs() < 1e-9);
    }
}
