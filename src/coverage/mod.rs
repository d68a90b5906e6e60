//! Full-body coverage validation.
//!
//! Two strategies answer the same question ("is the whole body, head through
//! ankles, visible and well placed?"):
//!
//! - `LandmarkCoverage` measures it from a pose skeleton.
//! - `RectangleCoverage` estimates it from the largest face and body rectangles.
//!
//! `CoverageEvaluator` holds one `CoverageStrategy`, chosen once per pipeline
//! configuration, and dispatches each frame to the matching validator.

mod bands;
mod feedback;
mod landmark;
mod rectangle;

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

use crate::pose::{LandmarkName, Skeleton};
use crate::rect::Rectangle;

pub use bands::{aspect_band_score, area_band_score, centering_score, margin_score, size_band_score};
pub use feedback::{render_feedback, FeedbackHint, SUCCESS_FEEDBACK};
pub use landmark::{LandmarkCoverage, LandmarkThresholds, REQUIRED_LANDMARKS};
pub use rectangle::{RectangleCoverage, RectangleThresholds};

/// Body regions scored independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Head,
    Torso,
    Arms,
    Legs,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Head, Region::Torso, Region::Arms, Region::Legs];

    pub fn landmarks(self) -> &'static [LandmarkName] {
        use LandmarkName::*;
        match self {
            Region::Head => &[Nose, LeftEar, RightEar],
            Region::Torso => &[LeftShoulder, RightShoulder, LeftHip, RightHip],
            Region::Arms => &[LeftElbow, RightElbow, LeftWrist, RightWrist],
            Region::Legs => &[LeftKnee, RightKnee, LeftAnkle, RightAnkle],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RegionCoverage {
    pub head: f32,
    pub torso: f32,
    pub arms: f32,
    pub legs: f32,
}

impl RegionCoverage {
    pub fn get(&self, region: Region) -> f32 {
        match region {
            Region::Head => self.head,
            Region::Torso => self.torso,
            Region::Arms => self.arms,
            Region::Legs => self.legs,
        }
    }

    pub fn min(&self) -> f32 {
        self.head.min(self.torso).min(self.arms).min(self.legs)
    }
}

/// Something the validator expected to see and did not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartName {
    Landmark(LandmarkName),
    Face,
    Body,
}

impl std::fmt::Display for PartName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartName::Landmark(name) => f.write_str(name.as_str()),
            PartName::Face => f.write_str("face"),
            PartName::Body => f.write_str("body"),
        }
    }
}

impl Serialize for PartName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Landmark,
    Rectangle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoverageValidationResult {
    pub is_valid: bool,
    pub confidence: f32,
    pub missing_parts: BTreeSet<PartName>,
    pub region_coverage: RegionCoverage,
    pub positioning_score: f32,
    pub body_coverage: f32,
    pub feedback: String,
    pub hints: Vec<FeedbackHint>,
    pub strategy: StrategyKind,
}

impl CoverageValidationResult {
    /// Result for a frame with nothing to validate.
    pub(crate) fn nothing_visible(
        strategy: StrategyKind,
        missing_parts: BTreeSet<PartName>,
        hints: BTreeSet<FeedbackHint>,
    ) -> Self {
        Self {
            is_valid: false,
            confidence: 0.0,
            missing_parts,
            region_coverage: RegionCoverage::default(),
            positioning_score: 0.0,
            body_coverage: 0.0,
            feedback: render_feedback(false, &hints),
            hints: hints.into_iter().collect(),
            strategy,
        }
    }
}

/// What a validator gets to look at for one frame.
#[derive(Clone, Copy, Debug)]
pub struct CoverageInput<'a> {
    pub rectangles: &'a [Rectangle],
    pub skeleton: Option<&'a Skeleton>,
    pub frame_width: u32,
    pub frame_height: u32,
}

pub trait CoverageValidator {
    fn validate(&self, input: &CoverageInput<'_>) -> CoverageValidationResult;
}

/// Which validator a pipeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoverageStrategy {
    /// Skeleton only. Frames without a skeleton fail coverage.
    Landmark,
    /// Rectangles only, even when a skeleton is available.
    Rectangle,
    /// Skeleton when the pose estimator found one, rectangles otherwise.
    #[default]
    PreferLandmark,
}

impl std::str::FromStr for CoverageStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "landmark" | "landmarks" => Ok(CoverageStrategy::Landmark),
            "rectangle" | "rectangles" => Ok(CoverageStrategy::Rectangle),
            "prefer_landmark" | "auto" => Ok(CoverageStrategy::PreferLandmark),
            other => Err(format!("unknown coverage strategy '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CoverageEvaluator {
    pub strategy: CoverageStrategy,
    pub landmark: LandmarkCoverage,
    pub rectangle: RectangleCoverage,
}

impl CoverageEvaluator {
    pub fn new(strategy: CoverageStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

impl CoverageValidator for CoverageEvaluator {
    fn validate(&self, input: &CoverageInput<'_>) -> CoverageValidationResult {
        match (self.strategy, input.skeleton) {
            (CoverageStrategy::Landmark, _) => self.landmark.validate(input),
            (CoverageStrategy::Rectangle, _) => self.rectangle.validate(input),
            (CoverageStrategy::PreferLandmark, Some(_)) => self.landmark.validate(input),
            (CoverageStrategy::PreferLandmark, None) => self.rectangle.validate(input),
        }
    }
}
