//! Frame confidence scoring.
//!
//! One scorer, two policies:
//!
//! - `Lenient`: single-frame realtime scan. Linear brightness/contrast credit,
//!   accepts at 0.5.
//! - `Strict`: full-body session scan. Requires both a face and a body, banded
//!   quality credit, a rectangle sanity check, accepts at 0.7 and only with a
//!   valid coverage result.

use serde::Serialize;

use crate::coverage::CoverageValidationResult;
use crate::dedup::{BODY_OVERLAP_THRESHOLD, FACE_OVERLAP_THRESHOLD};
use crate::frame::FrameQualityMetrics;
use crate::rect::{RectLabel, Rectangle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    Lenient,
    #[default]
    Strict,
}

impl std::str::FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(ScoringPolicy::Lenient),
            "strict" => Ok(ScoringPolicy::Strict),
            other => Err(format!("unknown scoring policy '{}'", other)),
        }
    }
}

impl ScoringPolicy {
    fn weights(self) -> (f32, f32) {
        match self {
            ScoringPolicy::Lenient => (0.3, 0.7),
            ScoringPolicy::Strict => (0.25, 0.5),
        }
    }

    pub fn params(self) -> PolicyParams {
        match self {
            ScoringPolicy::Lenient => PolicyParams::lenient(),
            ScoringPolicy::Strict => PolicyParams::strict(),
        }
    }
}

/// Named preset: everything that differs between the two scanners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyParams {
    pub policy: ScoringPolicy,
    pub accept_threshold: f32,
    /// Acceptance also needs `coverage.is_valid`.
    pub require_valid_coverage: bool,
    pub face_overlap_threshold: f32,
    pub body_overlap_threshold: f32,
    /// Equalize the luma histogram before measuring brightness/contrast.
    pub equalize_histogram: bool,
    /// Batch scans evaluate every n-th frame.
    pub frame_stride: u32,
}

impl PolicyParams {
    pub fn lenient() -> Self {
        Self {
            policy: ScoringPolicy::Lenient,
            accept_threshold: 0.5,
            require_valid_coverage: false,
            face_overlap_threshold: FACE_OVERLAP_THRESHOLD,
            body_overlap_threshold: BODY_OVERLAP_THRESHOLD,
            equalize_histogram: false,
            frame_stride: 5,
        }
    }

    pub fn strict() -> Self {
        Self {
            policy: ScoringPolicy::Strict,
            accept_threshold: 0.7,
            require_valid_coverage: true,
            face_overlap_threshold: FACE_OVERLAP_THRESHOLD,
            body_overlap_threshold: BODY_OVERLAP_THRESHOLD,
            equalize_histogram: true,
            frame_stride: 3,
        }
    }

    /// Whether a scored frame clears this preset's bar.
    pub fn accepts(
        &self,
        breakdown: &ConfidenceBreakdown,
        coverage: Option<&CoverageValidationResult>,
    ) -> bool {
        if breakdown.total < self.accept_threshold {
            return false;
        }
        if self.policy == ScoringPolicy::Strict
            && (breakdown.face_count == 0 || breakdown.body_count == 0)
        {
            return false;
        }
        if self.require_valid_coverage {
            return coverage.is_some_and(|c| c.is_valid);
        }
        true
    }
}

impl Default for PolicyParams {
    fn default() -> Self {
        ScoringPolicy::default().params()
    }
}

/// Everything the scorer looks at for one frame. Coverage is not part of the
/// score; it only gates acceptance in `PolicyParams::accepts`.
#[derive(Clone, Copy, Debug)]
pub struct ScoreInput<'a> {
    pub rectangles: &'a [Rectangle],
    pub quality: FrameQualityMetrics,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Per-term contributions to a frame's confidence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub face_count: usize,
    pub body_count: usize,
    pub detection_term: f32,
    /// Rectangle sanity check. Only weighted under `Strict`.
    pub quality_score: f32,
    pub brightness_term: f32,
    pub contrast_term: f32,
    pub total: f32,
}

pub fn score(input: &ScoreInput<'_>, policy: ScoringPolicy) -> f32 {
    breakdown(input, policy).total
}

pub fn breakdown(input: &ScoreInput<'_>, policy: ScoringPolicy) -> ConfidenceBreakdown {
    let face_count = input
        .rectangles
        .iter()
        .filter(|r| r.label == RectLabel::Face)
        .count();
    let body_count = input.rectangles.iter().filter(|r| r.label.is_body()).count();
    let detection_term = detection_term(face_count, body_count, policy);
    let brightness_term = brightness_term(input.quality.brightness, policy);
    let contrast_term = contrast_term(input.quality.contrast, policy);

    let (quality_score, total) = match policy {
        ScoringPolicy::Lenient => (0.0, detection_term + brightness_term + contrast_term),
        ScoringPolicy::Strict => {
            let q = rectangle_quality(input.rectangles, input.frame_width, input.frame_height);
            (
                q,
                0.6 * detection_term + 0.25 * q + brightness_term + contrast_term,
            )
        }
    };

    ConfidenceBreakdown {
        face_count,
        body_count,
        detection_term,
        quality_score,
        brightness_term,
        contrast_term,
        total: total.clamp(0.0, 1.0),
    }
}

/// Weighted detection counts. Strict caps the term at 0.3 unless both a face and
/// a body were seen.
pub fn detection_term(face_count: usize, body_count: usize, policy: ScoringPolicy) -> f32 {
    let (face_w, body_w) = policy.weights();
    let raw = face_w * face_count as f32 + body_w * body_count as f32;
    let cap = match policy {
        ScoringPolicy::Strict if face_count == 0 || body_count == 0 => 0.3,
        _ => 1.0,
    };
    raw.min(cap)
}

pub fn brightness_term(brightness: f32, policy: ScoringPolicy) -> f32 {
    if !brightness.is_finite() {
        return 0.0;
    }
    match policy {
        ScoringPolicy::Lenient => (brightness / 128.0).clamp(0.0, 1.0) * 0.2,
        ScoringPolicy::Strict => {
            if (40.0..=200.0).contains(&brightness) {
                0.15
            } else if (20.0..=220.0).contains(&brightness) {
                0.08
            } else {
                0.0
            }
        }
    }
}

pub fn contrast_term(contrast: f32, policy: ScoringPolicy) -> f32 {
    if !contrast.is_finite() {
        return 0.0;
    }
    match policy {
        ScoringPolicy::Lenient => (contrast / 50.0).clamp(0.0, 1.0) * 0.1,
        ScoringPolicy::Strict => {
            if contrast >= 30.0 {
                0.1
            } else if contrast >= 20.0 {
                0.05
            } else {
                0.0
            }
        }
    }
}

/// Geometric sanity of the rectangles: plausible sizes, proportions and
/// placement away from the frame edges. Capped at 1.0.
pub fn rectangle_quality(rects: &[Rectangle], frame_width: u32, frame_height: u32) -> f32 {
    if frame_width == 0 || frame_height == 0 {
        return 0.0;
    }
    let (w, h) = (frame_width as f32, frame_height as f32);
    let mut score = 0.0;

    for r in rects {
        let ratio = r.area_ratio(frame_width, frame_height);
        match r.label {
            RectLabel::Face => {
                if (0.005..=0.15).contains(&ratio) {
                    score += 0.2;
                } else if (0.001..=0.25).contains(&ratio) {
                    score += 0.1;
                }
                let width_over_height = crate::rect::safe_ratio(r.width, r.height);
                if (0.7..=1.3).contains(&width_over_height) {
                    score += 0.1;
                }
            }
            RectLabel::Body | RectLabel::UpperBody => {
                if (0.05..=0.5).contains(&ratio) {
                    score += 0.3;
                } else if (0.02..=0.7).contains(&ratio) {
                    score += 0.15;
                }
                if (1.5..=4.0).contains(&r.aspect_ratio()) {
                    score += 0.2;
                }
            }
        }
        let (cx, cy) = r.center();
        if (0.1..=0.9).contains(&(cx / w)) && (0.1..=0.9).contains(&(cy / h)) {
            score += 0.1;
        }
    }

    f32::min(score, 1.0)
}
