//! Sitting-posture classification against a calibrated baseline.
//!
//! Calibration captures body ratios from one reliable frame; every later
//! frame is compared against them in a fixed priority order, first match
//! wins. Ratio comparisons (distance, slouch, tilt) use fractional
//! tolerances; nose-height comparisons run in frame pixels against the
//! calibrated baseline.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::PostureConfig;
use crate::landmarks::{KeypointName, PoseFrame};

/// Critical keypoints: all must be reliable for classification or
/// calibration to proceed.
const CRITICAL_POINTS: [KeypointName; 5] = [
    KeypointName::Nose,
    KeypointName::LeftEar,
    KeypointName::RightEar,
    KeypointName::LeftShoulder,
    KeypointName::RightShoulder,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureLabel {
    Unknown,
    Uncalibrated,
    GoodPosture,
    Slouching,
    ShoulderTilt,
    TooFar,
    TooClose,
    /// Nose dropped below the calibrated height.
    SitUp,
    /// Nose rose moderately above the calibrated height.
    SitDown,
    Standing,
}

impl PostureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Uncalibrated => "Uncalibrated",
            Self::GoodPosture => "Good Posture",
            Self::Slouching => "Slouching",
            Self::ShoulderTilt => "Shoulder Tilt",
            Self::TooFar => "Too Far",
            Self::TooClose => "Too Close",
            Self::SitUp => "Sit Up",
            Self::SitDown => "Sit Down",
            Self::Standing => "Standing",
        }
    }

    /// Labels that accumulate toward a bad-posture alert.
    pub fn is_bad(&self) -> bool {
        !matches!(
            self,
            Self::GoodPosture | Self::Unknown | Self::Uncalibrated
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureVerdict {
    pub label: PostureLabel,
    /// 0–100.
    pub confidence: u8,
}

impl PostureVerdict {
    fn new(label: PostureLabel, confidence: u8) -> Self {
        Self { label, confidence }
    }
}

/// Baseline body ratios captured by an explicit calibration action.
/// Lives in memory until overwritten. `shoulder_width` is always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub vertical_gap_ratio: f64,
    pub tilt_ratio: f64,
    /// Pixels.
    pub shoulder_width: f64,
    /// Pixels.
    pub nose_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingTransition {
    StoodUp,
    SatDown,
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub verdict: PostureVerdict,
    /// Present when the standing flag flipped on a reliable frame.
    pub standing_transition: Option<StandingTransition>,
}

struct Measurements {
    shoulder_width: f64,
    vertical_gap_ratio: f64,
    tilt_ratio: f64,
    nose_y: f64,
}

fn measure(pose: &PoseFrame) -> Measurements {
    let left_shoulder = pose.get(KeypointName::LeftShoulder);
    let right_shoulder = pose.get(KeypointName::RightShoulder);
    let left_ear = pose.get(KeypointName::LeftEar);
    let right_ear = pose.get(KeypointName::RightEar);
    let nose = pose.get(KeypointName::Nose);

    let shoulder_width = (left_shoulder.x - right_shoulder.x).abs();
    let shoulder_mid_y = (left_shoulder.y + right_shoulder.y) / 2.0;
    let ear_mid_y = (left_ear.y + right_ear.y) / 2.0;

    Measurements {
        shoulder_width,
        vertical_gap_ratio: (shoulder_mid_y - ear_mid_y) / shoulder_width,
        tilt_ratio: (left_shoulder.y - right_shoulder.y).abs() / shoulder_width,
        nose_y: nose.y,
    }
}

pub struct PostureClassifier {
    config: PostureConfig,
    calibration: Option<CalibrationProfile>,
    is_standing: bool,
}

impl PostureClassifier {
    pub fn new(config: PostureConfig) -> Self {
        Self {
            config,
            calibration: None,
            is_standing: false,
        }
    }

    pub fn calibration(&self) -> Option<&CalibrationProfile> {
        self.calibration.as_ref()
    }

    pub fn is_standing(&self) -> bool {
        self.is_standing
    }

    /// Capture a calibration baseline from the given frame. Rejected, with
    /// nothing stored, unless every critical keypoint is reliable and the
    /// measured shoulder width is positive.
    pub fn calibrate(&mut self, pose: &PoseFrame) -> Result<CalibrationProfile> {
        if !pose.all_reliable(&CRITICAL_POINTS, self.config.score_threshold) {
            bail!("cannot see all required body parts (nose, ears, shoulders)");
        }

        let m = measure(pose);
        if m.shoulder_width <= 0.0 {
            bail!("calibration rejected: shoulder width must be positive");
        }

        let profile = CalibrationProfile {
            vertical_gap_ratio: m.vertical_gap_ratio,
            tilt_ratio: m.tilt_ratio,
            shoulder_width: m.shoulder_width,
            nose_y: m.nose_y,
        };
        self.calibration = Some(profile);
        Ok(profile)
    }

    /// Classify one frame. `None` covers the no-person case.
    pub fn classify(&mut self, pose: Option<&PoseFrame>) -> Classification {
        let Some(pose) = pose else {
            return self.unreliable_frame();
        };

        if !pose.all_reliable(&CRITICAL_POINTS, self.config.score_threshold) {
            return self.unreliable_frame();
        }

        let Some(cal) = self.calibration else {
            return Classification {
                verdict: PostureVerdict::new(PostureLabel::Uncalibrated, 0),
                standing_transition: None,
            };
        };

        let m = measure(pose);
        let verdict = self.evaluate(&m, &cal);

        let standing_now = verdict.label == PostureLabel::Standing;
        let standing_transition = if standing_now && !self.is_standing {
            self.is_standing = true;
            Some(StandingTransition::StoodUp)
        } else if !standing_now && self.is_standing {
            self.is_standing = false;
            Some(StandingTransition::SatDown)
        } else {
            None
        };

        Classification {
            verdict,
            standing_transition,
        }
    }

    /// First match wins; later checks are only reached when earlier ones
    /// pass.
    fn evaluate(&self, m: &Measurements, cal: &CalibrationProfile) -> PostureVerdict {
        let c = &self.config;
        let width_ratio = m.shoulder_width / cal.shoulder_width;

        if width_ratio < 1.0 - c.distance_tolerance {
            PostureVerdict::new(PostureLabel::TooFar, 80)
        } else if width_ratio > 1.0 + c.distance_tolerance {
            PostureVerdict::new(PostureLabel::TooClose, 80)
        } else if m.nose_y > cal.nose_y + c.height_tolerance_px {
            PostureVerdict::new(PostureLabel::SitUp, 75)
        } else if m.nose_y < cal.nose_y - c.standing_threshold_px {
            PostureVerdict::new(PostureLabel::Standing, 90)
        } else if m.nose_y < cal.nose_y - c.height_tolerance_px {
            PostureVerdict::new(PostureLabel::SitDown, 75)
        } else if m.vertical_gap_ratio < cal.vertical_gap_ratio - c.slouch_tolerance {
            PostureVerdict::new(PostureLabel::Slouching, 70)
        } else if (m.tilt_ratio - cal.tilt_ratio).abs() > c.tilt_tolerance {
            PostureVerdict::new(PostureLabel::ShoulderTilt, 80)
        } else {
            PostureVerdict::new(PostureLabel::GoodPosture, 100)
        }
    }

    /// No person or unreliable keypoints: report Unknown and treat the user
    /// as away. The away flag flips silently; the logged transition happens
    /// on the next reliable frame.
    fn unreliable_frame(&mut self) -> Classification {
        self.is_standing = true;
        Classification {
            verdict: PostureVerdict::new(PostureLabel::Unknown, 0),
            standing_transition: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::pose::test_support::{pose_with, seated_pose};

    fn calibrated_classifier() -> PostureClassifier {
        let mut classifier = PostureClassifier::new(PostureConfig::default());
        classifier.calibrate(&seated_pose(0.9)).unwrap();
        classifier
    }

    #[test]
    fn test_calibration_rejected_on_unreliable_keypoints() {
        let mut classifier = PostureClassifier::new(PostureConfig::default());
        assert!(classifier.calibrate(&seated_pose(0.1)).is_err());
        assert!(classifier.calibration().is_none());
    }

    #[test]
    fn test_calibration_rejected_on_zero_shoulder_width() {
        let mut classifier = PostureClassifier::new(PostureConfig::default());
        let pose = pose_with(0.9, 320.0, 320.0, 240.0, 200.0);
        assert!(classifier.calibrate(&pose).is_err());
        assert!(classifier.calibration().is_none());
    }

    #[test]
    fn test_calibration_frame_classifies_as_good() {
        let mut classifier = calibrated_classifier();
        let result = classifier.classify(Some(&seated_pose(0.9)));
        assert_eq!(result.verdict.label, PostureLabel::GoodPosture);
        assert_eq!(result.verdict.confidence, 100);
    }

    #[test]
    fn test_no_person_is_unknown() {
        let mut classifier = calibrated_classifier();
        let result = classifier.classify(None);
        assert_eq!(result.verdict.label, PostureLabel::Unknown);
        assert_eq!(result.verdict.confidence, 0);
    }

    #[test]
    fn test_unreliable_keypoints_are_unknown() {
        let mut classifier = calibrated_classifier();
        let result = classifier.classify(Some(&seated_pose(0.2)));
        assert_eq!(result.verdict.label, PostureLabel::Unknown);
    }

    #[test]
    fn test_uncalibrated_before_any_calibration() {
        let mut classifier = PostureClassifier::new(PostureConfig::default());
        let result = classifier.classify(Some(&seated_pose(0.9)));
        assert_eq!(result.verdict.label, PostureLabel::Uncalibrated);
        assert_eq!(result.verdict.confidence, 0);
    }

    #[test]
    fn test_shrunk_shoulders_are_too_far() {
        // Calibrated width 100 px, tolerance 0.15: 70 px is out of band.
        let mut classifier = calibrated_classifier();
        let pose = pose_with(0.9, 285.0, 355.0, 240.0, 200.0);
        let result = classifier.classify(Some(&pose));
        assert_eq!(result.verdict.label, PostureLabel::TooFar);
        assert_eq!(result.verdict.confidence, 80);
    }

    #[test]
    fn test_calibrated_width_is_not_distance_flagged() {
        let mut classifier = calibrated_classifier();
        let result = classifier.classify(Some(&seated_pose(0.9)));
        assert!(!matches!(
            result.verdict.label,
            PostureLabel::TooFar | PostureLabel::TooClose
        ));
    }

    #[test]
    fn test_widened_shoulders_are_too_close() {
        let mut classifier = calibrated_classifier();
        let pose = pose_with(0.9, 255.0, 385.0, 240.0, 200.0);
        let result = classifier.classify(Some(&pose));
        assert_eq!(result.verdict.label, PostureLabel::TooClose);
    }

    #[test]
    fn test_nose_dropped_is_sit_up() {
        let mut classifier = calibrated_classifier();
        let pose = pose_with(0.9, 270.0, 370.0, 240.0, 215.0);
        let result = classifier.classify(Some(&pose));
        assert_eq!(result.verdict.label, PostureLabel::SitUp);
        assert_eq!(result.verdict.confidence, 75);
    }

    #[test]
    fn test_large_nose_rise_is_standing() {
        let mut classifier = calibrated_classifier();
        let pose = pose_with(0.9, 270.0, 370.0, 240.0, 140.0);
        let result = classifier.classify(Some(&pose));
        assert_eq!(result.verdict.label, PostureLabel::Standing);
        assert_eq!(result.verdict.confidence, 90);
        assert_eq!(result.standing_transition, Some(StandingTransition::StoodUp));
    }

    #[test]
    fn test_moderate_nose_rise_is_sit_down() {
        let mut classifier = calibrated_classifier();
        let pose = pose_with(0.9, 270.0, 370.0, 240.0, 180.0);
        let result = classifier.classify(Some(&pose));
        assert_eq!(result.verdict.label, PostureLabel::SitDown);
    }

    #[test]
    fn test_collapsed_vertical_gap_is_slouching() {
        // Shoulders rise toward the ears: vertical gap ratio collapses
        // while the nose stays put.
        let mut classifier = calibrated_classifier();
        let pose = pose_with(0.9, 270.0, 370.0, 220.0, 200.0);
        let result = classifier.classify(Some(&pose));
        assert_eq!(result.verdict.label, PostureLabel::Slouching);
        assert_eq!(result.verdict.confidence, 70);
    }

    #[test]
    fn test_standing_transitions_once_each_way() {
        let mut classifier = calibrated_classifier();
        let standing = pose_with(0.9, 270.0, 370.0, 240.0, 140.0);

        let first = classifier.classify(Some(&standing));
        assert_eq!(first.standing_transition, Some(StandingTransition::StoodUp));

        let second = classifier.classify(Some(&standing));
        assert_eq!(second.standing_transition, None);

        let seated = classifier.classify(Some(&seated_pose(0.9)));
        assert_eq!(seated.standing_transition, Some(StandingTransition::SatDown));
    }

    #[test]
    fn test_unknown_marks_user_away() {
        let mut classifier = calibrated_classifier();
        classifier.classify(None);
        assert!(classifier.is_standing());

        // The logged transition lands on the next reliable frame.
        let result = classifier.classify(Some(&seated_pose(0.9)));
        assert_eq!(result.standing_transition, Some(StandingTransition::SatDown));
    }
}
