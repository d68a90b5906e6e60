use std::collections::BTreeSet;

use crate::pose::{LandmarkName, Skeleton};
use crate::rect::safe_ratio;

use super::bands::{
    aspect_band_score, centering_score, margin_score, positioning, size_band_score,
};
use super::feedback::{render_feedback, FeedbackHint};
use super::{
    CoverageInput, CoverageValidationResult, CoverageValidator, PartName, Region,
    RegionCoverage, StrategyKind,
};

/// Landmarks that must be seen for a head-to-ankle shot, grouped by region.
pub const REQUIRED_LANDMARKS: [LandmarkName; 15] = [
    LandmarkName::Nose,
    LandmarkName::LeftEar,
    LandmarkName::RightEar,
    LandmarkName::LeftShoulder,
    LandmarkName::RightShoulder,
    LandmarkName::LeftHip,
    LandmarkName::RightHip,
    LandmarkName::LeftElbow,
    LandmarkName::RightElbow,
    LandmarkName::LeftWrist,
    LandmarkName::RightWrist,
    LandmarkName::LeftKnee,
    LandmarkName::RightKnee,
    LandmarkName::LeftAnkle,
    LandmarkName::RightAnkle,
];

const CRITICAL_LANDMARKS: [LandmarkName; 3] = [
    LandmarkName::Nose,
    LandmarkName::LeftAnkle,
    LandmarkName::RightAnkle,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkThresholds {
    pub min_body_coverage: f32,
    pub min_positioning: f32,
    /// Floor applied to every region.
    pub min_region: f32,
    /// Stricter floor for the legs; the feet must be in frame.
    pub min_legs: f32,
}

impl Default for LandmarkThresholds {
    fn default() -> Self {
        Self {
            min_body_coverage: 0.8,
            min_positioning: 0.7,
            min_region: 0.6,
            min_legs: 0.8,
        }
    }
}

/// Coverage measured from pose landmarks.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkCoverage {
    pub thresholds: LandmarkThresholds,
    /// A landmark counts as visible strictly above this value.
    pub visibility_threshold: f32,
}

impl Default for LandmarkCoverage {
    fn default() -> Self {
        Self {
            thresholds: LandmarkThresholds::default(),
            visibility_threshold: 0.3,
        }
    }
}

/// Sub-scores of the visible landmarks' bounding box.
#[derive(Clone, Copy, Debug)]
struct Placement {
    center_x: f32,
    height_ratio: f32,
    top: f32,
    bottom: f32,
    aspect_ratio: f32,
}

impl Placement {
    fn centering(&self) -> f32 {
        centering_score(self.center_x)
    }

    fn margin(&self) -> f32 {
        margin_score(self.top, self.bottom)
    }

    fn score(&self) -> f32 {
        positioning(
            self.centering(),
            size_band_score(self.height_ratio),
            self.margin(),
            aspect_band_score(self.aspect_ratio),
        )
    }
}

impl LandmarkCoverage {
    fn visible(&self, skeleton: &Skeleton, name: LandmarkName) -> bool {
        skeleton.is_visible(name, self.visibility_threshold)
    }

    fn region_fraction(&self, skeleton: &Skeleton, region: Region) -> f32 {
        let members = region.landmarks();
        let seen = members
            .iter()
            .filter(|&&name| self.visible(skeleton, name))
            .count();
        seen as f32 / members.len() as f32
    }

    fn placement(&self, skeleton: &Skeleton, width: u32, height: u32) -> Option<Placement> {
        let mut visible = skeleton
            .landmarks
            .iter()
            .filter(|l| REQUIRED_LANDMARKS.contains(&l.name))
            .filter(|l| l.is_visible(self.visibility_threshold));
        let first = visible.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for l in visible {
            min_x = min_x.min(l.x);
            max_x = max_x.max(l.x);
            min_y = min_y.min(l.y);
            max_y = max_y.max(l.y);
        }
        let width_px = (max_x - min_x) * width as f32;
        let height_px = (max_y - min_y) * height as f32;
        Some(Placement {
            center_x: (min_x + max_x) / 2.0,
            height_ratio: max_y - min_y,
            top: min_y,
            bottom: max_y,
            aspect_ratio: safe_ratio(height_px, width_px),
        })
    }

    fn hints(
        &self,
        skeleton: &Skeleton,
        regions: &RegionCoverage,
        placement: Option<&Placement>,
    ) -> BTreeSet<FeedbackHint> {
        let t = &self.thresholds;
        let mut hints = BTreeSet::new();
        if !self.visible(skeleton, LandmarkName::Nose) || regions.head < t.min_region {
            hints.insert(FeedbackHint::ShowFace);
        }
        let ankles = [LandmarkName::LeftAnkle, LandmarkName::RightAnkle];
        if ankles.iter().any(|&a| !self.visible(skeleton, a)) || regions.legs < t.min_legs {
            hints.insert(FeedbackHint::ShowFeet);
        }
        if regions.torso < t.min_region || regions.arms < t.min_region {
            hints.insert(FeedbackHint::ShowFullBody);
        }
        if let Some(p) = placement {
            if p.height_ratio < 0.5 {
                hints.insert(FeedbackHint::MoveCloser);
            } else if p.height_ratio > 0.8 {
                hints.insert(FeedbackHint::StepBack);
            }
            if p.centering() < 0.5 {
                hints.insert(FeedbackHint::CenterYourself);
            }
            if p.margin() < 1.0 {
                hints.insert(FeedbackHint::LeaveMargin);
            }
        }
        hints
    }
}

impl CoverageValidator for LandmarkCoverage {
    fn validate(&self, input: &CoverageInput<'_>) -> CoverageValidationResult {
        let Some(skeleton) = input.skeleton else {
            let missing = REQUIRED_LANDMARKS.iter().map(|&n| PartName::Landmark(n)).collect();
            return CoverageValidationResult::nothing_visible(
                StrategyKind::Landmark,
                missing,
                BTreeSet::from([FeedbackHint::ShowFullBody]),
            );
        };

        let missing_parts: BTreeSet<PartName> = REQUIRED_LANDMARKS
            .iter()
            .filter(|&&name| !self.visible(skeleton, name))
            .map(|&name| PartName::Landmark(name))
            .collect();
        let region_coverage = RegionCoverage {
            head: self.region_fraction(skeleton, Region::Head),
            torso: self.region_fraction(skeleton, Region::Torso),
            arms: self.region_fraction(skeleton, Region::Arms),
            legs: self.region_fraction(skeleton, Region::Legs),
        };
        let body_coverage = (REQUIRED_LANDMARKS.len() - missing_parts.len()) as f32
            / REQUIRED_LANDMARKS.len() as f32;
        let placement = self.placement(skeleton, input.frame_width, input.frame_height);
        let positioning_score = placement.as_ref().map_or(0.0, Placement::score);
        let min_region = region_coverage.min();
        let critical_visible = CRITICAL_LANDMARKS
            .iter()
            .all(|&name| self.visible(skeleton, name));

        let t = &self.thresholds;
        let is_valid = body_coverage >= t.min_body_coverage
            && positioning_score >= t.min_positioning
            && min_region >= t.min_region
            && critical_visible
            && region_coverage.legs >= t.min_legs;
        let confidence =
            (0.4 * body_coverage + 0.4 * positioning_score + 0.2 * min_region).clamp(0.0, 1.0);

        let hints = if is_valid {
            BTreeSet::new()
        } else {
            self.hints(skeleton, &region_coverage, placement.as_ref())
        };

        CoverageValidationResult {
            is_valid,
            confidence,
            missing_parts,
            region_coverage,
            positioning_score,
            body_coverage,
            feedback: render_feedback(is_valid, &hints),
            hints: hints.into_iter().collect(),
            strategy: StrategyKind::Landmark,
        }
    }
}
