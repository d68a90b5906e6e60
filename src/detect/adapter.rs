//! Normalizes raw detector output into typed rectangles and a named skeleton.
//!
//! Nothing here fails: malformed items are dropped one by one, so a single bad
//! detector call costs at most that frame's detections.

use crate::pose::{Landmark, LandmarkName, Skeleton};
use crate::rect::{RectLabel, Rectangle};

use super::result::{RawRectangle, RawSkeleton};

/// Landmarks at or above this visibility enter the skeleton.
pub const LANDMARK_VISIBILITY_FLOOR: f32 = 0.3;

/// Map a detector class name onto a rectangle label.
pub fn parse_label(label: &str) -> Option<RectLabel> {
    match label.trim().to_ascii_lowercase().as_str() {
        "face" | "frontalface" | "frontalface_default" | "frontalface_alt" => {
            Some(RectLabel::Face)
        }
        "body" | "fullbody" | "full_body" | "person" => Some(RectLabel::Body),
        "upper_body" | "upperbody" => Some(RectLabel::UpperBody),
        _ => None,
    }
}

pub fn adapt_rectangles(raw: &[RawRectangle]) -> Vec<Rectangle> {
    raw.iter().filter_map(adapt_rectangle).collect()
}

fn adapt_rectangle(raw: &RawRectangle) -> Option<Rectangle> {
    let label = parse_label(&raw.label)?;
    let finite = [raw.x, raw.y, raw.width, raw.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || raw.width <= 0.0 || raw.height <= 0.0 {
        return None;
    }
    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or_else(|| label.default_confidence());
    Some(Rectangle::new(raw.x, raw.y, raw.width, raw.height, label).with_confidence(confidence))
}

/// Drop unknown ids, non-finite values and landmarks under the visibility floor.
/// A skeleton left empty is reported as no skeleton.
pub fn adapt_skeleton(raw: Option<&RawSkeleton>, visibility_floor: f32) -> Option<Skeleton> {
    let raw = raw?;
    let landmarks: Vec<Landmark> = raw
        .landmarks
        .iter()
        .filter(|l| l.x.is_finite() && l.y.is_finite() && l.visibility.is_finite())
        .filter(|l| l.visibility >= visibility_floor)
        .filter_map(|l| {
            let name = LandmarkName::from_index(l.index)?;
            Some(Landmark::new(name, l.x, l.y, l.visibility.min(1.0)))
        })
        .collect();
    if landmarks.is_empty() {
        None
    } else {
        Some(Skeleton::new(landmarks))
    }
}

/// `adapt(raw_rect_detections, raw_pose_output) -> (rectangles, skeleton)`.
pub fn adapt(
    raw_rects: &[RawRectangle],
    raw_pose: Option<&RawSkeleton>,
) -> (Vec<Rectangle>, Option<Skeleton>) {
    (
        adapt_rectangles(raw_rects),
        adapt_skeleton(raw_pose, LANDMARK_VISIBILITY_FLOOR),
    )
}
