//! Hand-shape classifiers.
//!
//! Pure functions over the 21 landmarks. All checks work on the image-y
//! ordering of fingertip vs. proximal joint (y grows downward, so an
//! extended finger has its tip above, i.e. numerically below, its PIP
//! joint), plus a thumb-straightness ratio for the open hand.

use crate::geometry::distance;
use crate::landmarks::{HandFrame, HandLandmarkId};

use HandLandmarkId::*;

/// All four fingers curled: every tip below its PIP joint.
pub fn is_fist(hand: &HandFrame) -> bool {
    hand.get(IndexTip).y > hand.get(IndexPip).y
        && hand.get(MiddleTip).y > hand.get(MiddlePip).y
        && hand.get(RingTip).y > hand.get(RingPip).y
        && hand.get(PinkyTip).y > hand.get(PinkyPip).y
}

/// Index and middle extended, ring and pinky curled.
pub fn is_peace(hand: &HandFrame) -> bool {
    hand.get(IndexTip).y < hand.get(IndexPip).y
        && hand.get(MiddleTip).y < hand.get(MiddlePip).y
        && hand.get(RingTip).y > hand.get(RingPip).y
        && hand.get(PinkyTip).y > hand.get(PinkyPip).y
}

/// All four fingers extended and the thumb straight. The straightness
/// ratio distinguishes a flat open palm from a loose fist: for a straight
/// thumb, MCP→tip distance approaches the sum of the two segment lengths.
pub fn is_open_hand(hand: &HandFrame) -> bool {
    let fingers_extended = hand.get(IndexTip).y < hand.get(IndexPip).y
        && hand.get(MiddleTip).y < hand.get(MiddlePip).y
        && hand.get(RingTip).y < hand.get(RingPip).y
        && hand.get(PinkyTip).y < hand.get(PinkyPip).y;

    if !fingers_extended {
        return false;
    }

    let thumb_len = distance(hand.get(ThumbMcp), hand.get(ThumbTip));
    let thumb_segments = distance(hand.get(ThumbMcp), hand.get(ThumbIp))
        + distance(hand.get(ThumbIp), hand.get(ThumbTip));

    thumb_len > 0.9 * thumb_segments
}
