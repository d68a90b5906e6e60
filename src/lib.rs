//! framegate
//!
//! Streaming frame-quality and pose-coverage evaluation. Frames go in, each one
//! is scored for how well it shows one whole person, and every session keeps the
//! single best frame it has seen.
//!
//! # Pipeline
//!
//! 1. `detect`: external rectangle detector and pose estimator, run through an
//!    `InferenceView`; raw output is adapted into typed `Rectangle`s and a `Skeleton`.
//! 2. `dedup`: near-duplicate rectangles collapse to the first occurrence.
//! 3. `coverage`: landmark or rectangle strategy decides whether the body is
//!    fully and properly framed, with user-facing feedback.
//! 4. `scoring`: detections, coverage and brightness/contrast fold into one
//!    confidence under a `ScoringPolicy`.
//! 5. `session`: best-frame tracking per connection.
//! 6. `emit`: JSON reports.
//!
//! `FrameGate` wires a `FramePipeline` to a `SessionRegistry`.
//!
//! # Frame handling
//!
//! `RawFrame` pixels are private, never serialized, and zeroized on drop.
//! Reports identify frames by SHA-256 digest.

pub mod config;
pub mod coverage;
pub mod dedup;
pub mod detect;
pub mod emit;
pub mod error;
pub mod frame;
pub mod gate;
pub mod pipeline;
pub mod pose;
pub mod rect;
pub mod scoring;
pub mod session;

pub use config::GateConfig;
pub use coverage::{
    CoverageEvaluator, CoverageStrategy, CoverageValidationResult, CoverageValidator, FeedbackHint,
    Region, RegionCoverage,
};
pub use detect::{PoseEstimator, RectangleDetector, ScriptStep, ScriptedDetector, SyntheticPerson};
pub use emit::{BestFrameReport, FrameReport};
pub use error::{FrameGateError, Result};
pub use frame::{FrameQualityMetrics, InferenceView, PixelFormat, RawFrame};
pub use gate::FrameGate;
pub use pipeline::{DetectionResult, FramePipeline, PipelineConfig, ScanOutcome, ScanSummary};
pub use pose::{Landmark, LandmarkName, Skeleton};
pub use rect::{RectLabel, Rectangle};
pub use scoring::{ConfidenceBreakdown, PolicyParams, ScoringPolicy};
pub use session::{BestFrame, PromotionRule, Session, SessionRegistry, SessionState};
