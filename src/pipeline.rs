//! Per-frame evaluation: detect, adapt, dedupe, validate coverage, score.
//!
//! The pipeline is stateless across frames. Best-frame tracking lives in
//! `session`; the pipeline only produces a `DetectionResult` per frame.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::coverage::{
    CoverageEvaluator, CoverageInput, CoverageStrategy, CoverageValidationResult, CoverageValidator,
};
use crate::dedup::dedupe_by_class;
use crate::detect::{adapt, PoseEstimator, RawRectangle, RawSkeleton, RectangleDetector};
use crate::error::{FrameGateError, Result};
use crate::frame::{FrameQualityMetrics, RawFrame};
use crate::pose::Skeleton;
use crate::rect::Rectangle;
use crate::scoring::{self, ConfidenceBreakdown, PolicyParams, ScoreInput};
use crate::session::{BestFrame, PromotionRule, Session};

pub const DEFAULT_FPS: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    pub params: PolicyParams,
    pub coverage: CoverageStrategy,
    /// Skip coverage validation entirely. Only meaningful for policies that do
    /// not require valid coverage.
    pub validate_coverage: bool,
    /// Frame rate used to derive result timestamps.
    pub fps: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            params: PolicyParams::default(),
            coverage: CoverageStrategy::default(),
            validate_coverage: true,
            fps: DEFAULT_FPS,
        }
    }
}

/// Outcome of evaluating one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionResult {
    pub frame_number: u64,
    /// Seconds, `frame_number / fps`.
    pub timestamp: f64,
    pub confidence: f32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub rectangles: Vec<Rectangle>,
    pub skeleton: Option<Skeleton>,
    pub quality: FrameQualityMetrics,
    pub coverage: Option<CoverageValidationResult>,
    pub breakdown: ConfidenceBreakdown,
    /// Whether the scoring policy accepts this frame.
    pub accepted: bool,
}

pub type SharedRectangleDetector = Arc<Mutex<dyn RectangleDetector>>;
pub type SharedPoseEstimator = Arc<Mutex<dyn PoseEstimator>>;

pub struct FramePipeline {
    config: PipelineConfig,
    evaluator: CoverageEvaluator,
    rectangles: SharedRectangleDetector,
    pose: Option<SharedPoseEstimator>,
}

impl std::fmt::Debug for FramePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePipeline")
            .field("config", &self.config)
            .field("pose", &self.pose.is_some())
            .finish()
    }
}

pub struct FramePipelineBuilder {
    config: PipelineConfig,
    rectangles: Option<SharedRectangleDetector>,
    pose: Option<SharedPoseEstimator>,
}

impl FramePipelineBuilder {
    pub fn rectangle_detector(mut self, detector: SharedRectangleDetector) -> Self {
        self.rectangles = Some(detector);
        self
    }

    pub fn pose_estimator(mut self, estimator: SharedPoseEstimator) -> Self {
        self.pose = Some(estimator);
        self
    }

    /// Warm up the detectors and assemble the pipeline. A rectangle detector is
    /// required; a failed warm-up is logged and tolerated.
    pub fn build(self) -> Result<FramePipeline> {
        let rectangles = self
            .rectangles
            .ok_or_else(|| FrameGateError::Config("pipeline needs a rectangle detector".into()))?;

        if let Ok(mut detector) = rectangles.lock() {
            if let Err(e) = detector.warm_up() {
                log::warn!("rectangle detector {} warm-up failed: {:#}", detector.name(), e);
            }
        }
        if let Some(pose) = &self.pose {
            if let Ok(mut estimator) = pose.lock() {
                if let Err(e) = estimator.warm_up() {
                    log::warn!("pose estimator {} warm-up failed: {:#}", estimator.name(), e);
                }
            }
        }

        Ok(FramePipeline {
            evaluator: CoverageEvaluator::new(self.config.coverage),
            config: self.config,
            rectangles,
            pose: self.pose,
        })
    }
}

/// Result of a batch scan over a finite frame sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub frames_seen: u64,
    pub frames_analyzed: u64,
    pub frames_accepted: u64,
    pub best_frame_number: Option<u64>,
    pub best_confidence: f32,
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub summary: ScanSummary,
    pub best: Option<BestFrame>,
}

impl FramePipeline {
    pub fn builder(config: PipelineConfig) -> FramePipelineBuilder {
        FramePipelineBuilder {
            config,
            rectangles: None,
            pose: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Evaluate one frame. Detector failures degrade to "nothing detected".
    pub fn evaluate(&self, frame: &RawFrame, frame_number: u64) -> DetectionResult {
        let params = &self.config.params;
        let (raw_rects, raw_pose) = self.detect(frame);
        let (rects, skeleton) = adapt(&raw_rects, raw_pose.as_ref());
        let rectangles = dedupe_by_class(
            &rects,
            params.face_overlap_threshold,
            params.body_overlap_threshold,
        );
        let quality = frame.quality(params.equalize_histogram);

        let coverage = self.config.validate_coverage.then(|| {
            self.evaluator.validate(&CoverageInput {
                rectangles: &rectangles,
                skeleton: skeleton.as_ref(),
                frame_width: frame.width,
                frame_height: frame.height,
            })
        });

        let breakdown = scoring::breakdown(
            &ScoreInput {
                rectangles: &rectangles,
                quality,
                frame_width: frame.width,
                frame_height: frame.height,
            },
            params.policy,
        );
        let accepted = params.accepts(&breakdown, coverage.as_ref());

        DetectionResult {
            frame_number,
            timestamp: frame_number as f64 / self.config.fps,
            confidence: breakdown.total,
            frame_width: frame.width,
            frame_height: frame.height,
            rectangles,
            skeleton,
            quality,
            coverage,
            breakdown,
            accepted,
        }
    }

    fn detect(&self, frame: &RawFrame) -> (Vec<RawRectangle>, Option<RawSkeleton>) {
        let view = frame.inference_view();

        let rects = match self.rectangles.lock() {
            Ok(mut detector) => match view.run_rectangle_detector(&mut *detector) {
                Ok(rects) => rects,
                Err(e) => {
                    log::warn!("rectangle detector {} failed: {:#}", detector.name(), e);
                    Vec::new()
                }
            },
            Err(_) => {
                log::warn!("rectangle detector lock poisoned; treating frame as empty");
                Vec::new()
            }
        };

        let pose = self.pose.as_ref().and_then(|pose| match pose.lock() {
            Ok(mut estimator) => match view.run_pose_estimator(&mut *estimator) {
                Ok(skeleton) => skeleton,
                Err(e) => {
                    log::warn!("pose estimator {} failed: {:#}", estimator.name(), e);
                    None
                }
            },
            Err(_) => {
                log::warn!("pose estimator lock poisoned; skipping pose");
                None
            }
        });

        (rects, pose)
    }

    /// Walk a finite sequence, evaluating every `frame_stride`-th frame (counted
    /// from one), and keep the best frame the promotion rule allows.
    /// Frame numbers are zero-based positions in the sequence.
    pub fn scan<I>(&self, frames: I, rule: PromotionRule) -> ScanOutcome
    where
        I: IntoIterator<Item = RawFrame>,
    {
        let stride = u64::from(self.config.params.frame_stride.max(1));
        let mut session = Session::new(rule);
        let mut summary = ScanSummary::default();

        for (position, frame) in (0u64..).zip(frames) {
            summary.frames_seen += 1;
            if summary.frames_seen % stride != 0 {
                continue;
            }
            summary.frames_analyzed += 1;
            let result = self.evaluate(&frame, position);
            if result.accepted {
                summary.frames_accepted += 1;
            }
            session.offer(frame, &result);
        }

        let best = session.get_best();
        if let Some(best) = &best {
            summary.best_frame_number = Some(best.frame_number);
            summary.best_confidence = best.confidence;
        }
        log::info!(
            "scan finished: {} frames seen, {} analyzed, {} accepted",
            summary.frames_seen,
            summary.frames_analyzed,
            summary.frames_accepted
        );
        ScanOutcome { summary, best }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ScriptStep, ScriptedDetector};
    use crate::frame::PixelFormat;
    use crate::scoring::ScoringPolicy;

    fn gray_frame(width: u32, height: u32, value: u8) -> RawFrame {
        let pixels = vec![value; (width * height * 3) as usize];
        RawFrame::from_pixels(&pixels, width, height, PixelFormat::Rgb24).unwrap()
    }

    fn pipeline(policy: ScoringPolicy, steps: Vec<ScriptStep>) -> FramePipeline {
        let detector = Arc::new(Mutex::new(ScriptedDetector::new(steps)));
        FramePipeline::builder(PipelineConfig {
            params: policy.params(),
            ..PipelineConfig::default()
        })
        .rectangle_detector(detector)
        .build()
        .unwrap()
    }

    fn person_step() -> ScriptStep {
        ScriptStep::Detections {
            rectangles: vec![
                RawRectangle::new("face", 295.0, 60.0, 50.0, 50.0),
                RawRectangle::new("face", 300.0, 62.0, 50.0, 50.0),
                RawRectangle::new("body", 230.0, 50.0, 180.0, 360.0),
            ],
            skeleton: None,
        }
    }

    #[test]
    fn builder_requires_rectangle_detector() {
        let err = FramePipeline::builder(PipelineConfig::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, FrameGateError::Config(_)));
    }

    #[test]
    fn timestamp_follows_fps() {
        let p = pipeline(ScoringPolicy::Lenient, vec![ScriptStep::empty()]);
        let result = p.evaluate(&gray_frame(8, 8, 128), 45);
        assert!((result.timestamp - 1.5).abs() < 1e-9);
    }

    #[test]
    fn duplicate_faces_are_removed_before_scoring() {
        let p = pipeline(ScoringPolicy::Lenient, vec![person_step()]);
        let result = p.evaluate(&gray_frame(640, 480, 128), 0);
        assert_eq!(result.breakdown.face_count, 1);
        assert_eq!(result.breakdown.body_count, 1);
        assert_eq!(result.rectangles.len(), 2);
    }

    #[test]
    fn detector_failure_degrades_to_empty() {
        let p = pipeline(
            ScoringPolicy::Lenient,
            vec![ScriptStep::Failure("camera unplugged".into())],
        );
        let result = p.evaluate(&gray_frame(16, 16, 128), 3);
        assert!(result.rectangles.is_empty());
        assert_eq!(result.breakdown.detection_term, 0.0);
        assert!(!result.accepted);
        assert!(result.coverage.as_ref().is_some_and(|c| !c.is_valid));
    }

    #[test]
    fn strict_accepts_well_framed_person() {
        let p = pipeline(ScoringPolicy::Strict, vec![person_step()]);
        let result = p.evaluate(&gray_frame(640, 480, 128), 0);
        assert!(result.coverage.as_ref().is_some_and(|c| c.is_valid));
        assert!(result.confidence >= 0.7, "{:?}", result.breakdown);
        assert!(result.accepted);
    }

    #[test]
    fn strict_rejects_person_with_invalid_coverage() {
        let step = ScriptStep::Detections {
            rectangles: vec![
                RawRectangle::new("face", 310.0, 200.0, 20.0, 20.0),
                RawRectangle::new("body", 295.0, 200.0, 50.0, 100.0),
            ],
            skeleton: None,
        };
        let p = pipeline(ScoringPolicy::Strict, vec![step]);
        let result = p.evaluate(&gray_frame(640, 480, 128), 0);
        assert!(result.coverage.as_ref().is_some_and(|c| !c.is_valid));
        assert!(!result.accepted);
    }

    #[test]
    fn scan_uses_one_based_stride() {
        let p = pipeline(ScoringPolicy::Lenient, vec![person_step()]);
        let frames = (0..12).map(|_| gray_frame(640, 480, 128));
        let outcome = p.scan(frames, PromotionRule::AcceptedOnly);
        assert_eq!(outcome.summary.frames_seen, 12);
        // stride 5: the 5th and 10th frames
        assert_eq!(outcome.summary.frames_analyzed, 2);
        assert_eq!(outcome.summary.best_frame_number, Some(4));
        assert!(outcome.best.is_some());
    }

    #[test]
    fn scan_of_empty_stream_keeps_nothing() {
        let p = pipeline(ScoringPolicy::Strict, vec![ScriptStep::empty()]);
        let outcome = p.scan(std::iter::empty(), PromotionRule::AcceptedOnly);
        assert_eq!(outcome.summary, ScanSummary::default());
        assert!(outcome.best.is_none());
    }
}
