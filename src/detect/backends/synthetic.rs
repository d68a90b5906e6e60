use crate::detect::result::{RawLandmark, RawRectangle, RawSkeleton};
use crate::pose::LandmarkName;

use super::scripted::ScriptStep;

/// Geometry of a synthetic standing person, in normalized frame coordinates.
///
/// Produces the detector output a real face/body detector and pose estimator
/// would report for such a person: one face, one full-body rectangle and the
/// fifteen landmarks coverage validation needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticPerson {
    /// Nose-to-ankle height over frame height.
    pub height_ratio: f32,
    /// Pixel height over pixel width of the landmark bounding box.
    pub aspect: f32,
    pub center_x: f32,
    pub visibility: f32,
}

impl Default for SyntheticPerson {
    fn default() -> Self {
        Self {
            height_ratio: 0.65,
            aspect: 2.0,
            center_x: 0.5,
            visibility: 0.9,
        }
    }
}

impl SyntheticPerson {
    fn top(&self) -> f32 {
        (1.0 - self.height_ratio) / 2.0
    }

    fn half_width(&self, frame_width: u32, frame_height: u32) -> f32 {
        let height_px = self.height_ratio * frame_height as f32;
        height_px / self.aspect / frame_width as f32 / 2.0
    }

    pub fn skeleton(&self, frame_width: u32, frame_height: u32) -> RawSkeleton {
        use LandmarkName::*;

        let top = self.top();
        let bottom = top + self.height_ratio;
        let cx = self.center_x;
        let hw = self.half_width(frame_width, frame_height);
        let at = |t: f32| top + t * self.height_ratio;
        let points = [
            (Nose, cx, top),
            (LeftEar, cx - hw * 0.3, at(0.02)),
            (RightEar, cx + hw * 0.3, at(0.02)),
            (LeftShoulder, cx - hw * 0.6, at(0.2)),
            (RightShoulder, cx + hw * 0.6, at(0.2)),
            (LeftElbow, cx - hw, at(0.35)),
            (RightElbow, cx + hw, at(0.35)),
            (LeftWrist, cx - hw, at(0.5)),
            (RightWrist, cx + hw, at(0.5)),
            (LeftHip, cx - hw * 0.4, at(0.55)),
            (RightHip, cx + hw * 0.4, at(0.55)),
            (LeftKnee, cx - hw * 0.4, at(0.78)),
            (RightKnee, cx + hw * 0.4, at(0.78)),
            (LeftAnkle, cx - hw * 0.4, bottom),
            (RightAnkle, cx + hw * 0.4, bottom),
        ];
        RawSkeleton {
            landmarks: points
                .iter()
                .map(|&(name, x, y)| RawLandmark {
                    index: name.index(),
                    x,
                    y,
                    visibility: self.visibility,
                })
                .collect(),
        }
    }

    /// Face and full-body rectangles in pixel space. The face is a square
    /// around the nose, 16% of the body height on a side.
    pub fn rectangles(&self, frame_width: u32, frame_height: u32) -> Vec<RawRectangle> {
        let (w, h) = (frame_width as f32, frame_height as f32);
        let body_h = self.height_ratio * h;
        let body_w = 2.0 * self.half_width(frame_width, frame_height) * w;
        let body_x = self.center_x * w - body_w / 2.0;
        let body_y = self.top() * h;
        let face = 0.16 * body_h;
        vec![
            RawRectangle::new("face", self.center_x * w - face / 2.0, body_y, face, face),
            RawRectangle::new("fullbody", body_x, body_y, body_w, body_h),
        ]
    }

    pub fn step(&self, frame_width: u32, frame_height: u32) -> ScriptStep {
        ScriptStep::Detections {
            rectangles: self.rectangles(frame_width, frame_height),
            skeleton: Some(self.skeleton(frame_width, frame_height)),
        }
    }

    /// Same person with some landmarks dropped, as when they leave the frame.
    pub fn step_without(
        &self,
        frame_width: u32,
        frame_height: u32,
        missing: &[LandmarkName],
    ) -> ScriptStep {
        let mut skeleton = self.skeleton(frame_width, frame_height);
        skeleton
            .landmarks
            .retain(|l| LandmarkName::from_index(l.index).is_some_and(|n| !missing.contains(&n)));
        ScriptStep::Detections {
            rectangles: self.rectangles(frame_width, frame_height),
            skeleton: Some(skeleton),
        }
    }
}
