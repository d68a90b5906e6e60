use std::collections::BTreeSet;

use crate::rect::{largest, RectLabel, Rectangle};

use super::bands::{aspect_band_score, area_band_score, centering_score, margin_score, positioning};
use super::feedback::{render_feedback, FeedbackHint};
use super::{
    CoverageInput, CoverageValidationResult, CoverageValidator, PartName, RegionCoverage,
    StrategyKind,
};

/// Region coverage assumed when both a face and a body rectangle exist.
/// Rectangles cannot measure limbs, so these are estimates, not measurements.
const ESTIMATED_REGIONS: RegionCoverage = RegionCoverage {
    head: 1.0,
    torso: 0.8,
    arms: 0.6,
    legs: 0.7,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectangleThresholds {
    /// Minimum body-rectangle area as a fraction of the frame.
    pub min_body_coverage: f32,
    pub min_positioning: f32,
    pub min_region: f32,
}

impl Default for RectangleThresholds {
    fn default() -> Self {
        Self {
            min_body_coverage: 0.2,
            min_positioning: 0.6,
            min_region: 0.5,
        }
    }
}

/// Coverage estimated from the largest face and body rectangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RectangleCoverage {
    pub thresholds: RectangleThresholds,
}

impl RectangleCoverage {
    /// Positioning of a body rectangle: centering, area band, margins, aspect.
    pub fn positioning_score(&self, body: &Rectangle, frame_width: u32, frame_height: u32) -> f32 {
        let (w, h) = (frame_width as f32, frame_height as f32);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        let (center_x, _) = body.center();
        positioning(
            centering_score(center_x / w),
            area_band_score(body.area_ratio(frame_width, frame_height)),
            margin_score(body.y / h, body.bottom() / h),
            aspect_band_score(body.aspect_ratio()),
        )
    }
}

impl CoverageValidator for RectangleCoverage {
    fn validate(&self, input: &CoverageInput<'_>) -> CoverageValidationResult {
        let face = largest(input.rectangles, |r| r.label == RectLabel::Face);
        let body = largest(input.rectangles, |r| r.label.is_body());

        let body = match (face, body) {
            (Some(_), Some(body)) => body,
            (face, body) => {
                let mut missing = BTreeSet::new();
                let mut hints = BTreeSet::new();
                if face.is_none() {
                    missing.insert(PartName::Face);
                    hints.insert(FeedbackHint::ShowFace);
                }
                if body.is_none() {
                    missing.insert(PartName::Body);
                    hints.insert(FeedbackHint::ShowFullBody);
                }
                return CoverageValidationResult::nothing_visible(
                    StrategyKind::Rectangle,
                    missing,
                    hints,
                );
            }
        };

        let body_coverage = body.area_ratio(input.frame_width, input.frame_height);
        let positioning_score = self.positioning_score(body, input.frame_width, input.frame_height);
        let region_coverage = ESTIMATED_REGIONS;
        let min_region = region_coverage.min();

        let t = &self.thresholds;
        let is_valid = body_coverage >= t.min_body_coverage
            && positioning_score >= t.min_positioning
            && min_region >= t.min_region;
        let confidence =
            (0.4 * body_coverage + 0.4 * positioning_score + 0.2 * min_region).clamp(0.0, 1.0);

        let mut hints = BTreeSet::new();
        if !is_valid {
            if body_coverage < t.min_body_coverage {
                hints.insert(FeedbackHint::MoveCloser);
            } else if body_coverage > 0.7 {
                hints.insert(FeedbackHint::StepBack);
            }
            if positioning_score < t.min_positioning {
                hints.insert(FeedbackHint::CenterYourself);
            }
        }

        CoverageValidationResult {
            is_valid,
            confidence,
            missing_parts: BTreeSet::new(),
            region_coverage,
            positioning_score,
            body_coverage,
            feedback: render_feedback(is_valid, &hints),
            hints: hints.into_iter().collect(),
            strategy: StrategyKind::Rectangle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(rects: &[Rectangle]) -> CoverageValidationResult {
        RectangleCoverage::default().validate(&CoverageInput {
            rectangles: rects,
            skeleton: None,
            frame_width: 640,
            frame_height: 480,
        })
    }

    fn person(body_x: f32) -> [Rectangle; 2] {
        [
            Rectangle::new(body_x + 65.0, 60.0, 50.0, 50.0, RectLabel::Face),
            // 180x360 on 640x480: area ratio 0.21, aspect 2.0
            Rectangle::new(body_x, 50.0, 180.0, 360.0, RectLabel::Body),
        ]
    }

    #[test]
    fn centered_person_passes_looser_bar() {
        let result = validate(&person(230.0));
        assert!(result.is_valid, "{:?}", result);
        assert_eq!(result.region_coverage, ESTIMATED_REGIONS);
        assert!((result.positioning_score - 1.0).abs() < 1e-4);
        assert!(result.missing_parts.is_empty());
    }

    #[test]
    fn missing_face_fails_with_zero_regions() {
        let [_, body] = person(230.0);
        let result = validate(&[body]);
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.region_coverage, RegionCoverage::default());
        assert!(result.missing_parts.contains(&PartName::Face));
        assert!(result.hints.contains(&FeedbackHint::ShowFace));
    }

    #[test]
    fn small_body_is_told_to_move_closer() {
        let rects = [
            Rectangle::new(310.0, 200.0, 20.0, 20.0, RectLabel::Face),
            Rectangle::new(295.0, 200.0, 50.0, 100.0, RectLabel::UpperBody),
        ];
        let result = validate(&rects);
        assert!(!result.is_valid);
        assert!(result.hints.contains(&FeedbackHint::MoveCloser));
    }

    #[test]
    fn largest_rectangles_are_used() {
        let mut rects = person(230.0).to_vec();
        rects.push(Rectangle::new(0.0, 0.0, 20.0, 30.0, RectLabel::Body));
        let result = validate(&rects);
        assert!(result.is_valid);
        assert!((result.body_coverage - 180.0 * 360.0 / (640.0 * 480.0)).abs() < 1e-6);
    }
}
