//! Connection-facing entry point: a shared pipeline plus a session registry.

use crate::config::GateConfig;
use crate::emit::BestFrameReport;
use crate::error::Result;
use crate::frame::{PixelFormat, RawFrame};
use crate::pipeline::{DetectionResult, FramePipeline, SharedPoseEstimator, SharedRectangleDetector};
use crate::session::{lock_session, BestFrame, PromotionRule, SessionRegistry, SessionState};

#[derive(Debug)]
pub struct FrameGate {
    pipeline: FramePipeline,
    sessions: SessionRegistry,
}

impl FrameGate {
    pub fn new(pipeline: FramePipeline, promotion: PromotionRule) -> Self {
        Self {
            pipeline,
            sessions: SessionRegistry::new(promotion),
        }
    }

    /// Build a gate from resolved configuration and injected detectors.
    pub fn from_config(
        config: &GateConfig,
        rectangles: SharedRectangleDetector,
        pose: Option<SharedPoseEstimator>,
    ) -> Result<Self> {
        let mut builder = FramePipeline::builder(config.pipeline()).rectangle_detector(rectangles);
        if let Some(pose) = pose {
            builder = builder.pose_estimator(pose);
        }
        Ok(Self::new(builder.build()?, config.promotion))
    }

    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }

    pub fn open_session(&self, session_id: &str) -> Result<()> {
        self.sessions.open(session_id).map(|_| ())
    }

    pub fn close_session(&self, session_id: &str) -> Result<()> {
        self.sessions.close(session_id)
    }

    /// Evaluate a frame and offer it to the session. Evaluation runs outside
    /// the session lock; only the promotion step holds it. If the session is
    /// reset while the frame is being evaluated, the frame is discarded and the
    /// returned result is not reflected in the session.
    pub fn ingest_frame(
        &self,
        session_id: &str,
        frame: RawFrame,
        frame_number: u64,
    ) -> Result<DetectionResult> {
        let handle = self.sessions.get(session_id)?;
        let generation = lock_session(&handle)?.generation();
        let result = self.pipeline.evaluate(&frame, frame_number);
        lock_session(&handle)?.offer_since(generation, frame, &result);
        Ok(result)
    }

    /// Validate raw pixels, then ingest. Malformed input leaves the session
    /// untouched.
    pub fn ingest_pixels(
        &self,
        session_id: &str,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        frame_number: u64,
    ) -> Result<DetectionResult> {
        self.sessions.get(session_id)?;
        let frame = RawFrame::from_pixels(pixels, width, height, format)?;
        self.ingest_frame(session_id, frame, frame_number)
    }

    #[cfg(feature = "jpeg")]
    pub fn ingest_jpeg(
        &self,
        session_id: &str,
        bytes: &[u8],
        frame_number: u64,
    ) -> Result<DetectionResult> {
        self.sessions.get(session_id)?;
        let frame = RawFrame::decode_jpeg(bytes)?;
        self.ingest_frame(session_id, frame, frame_number)
    }

    pub fn reset_session(&self, session_id: &str) -> Result<()> {
        let handle = self.sessions.get(session_id)?;
        lock_session(&handle)?.reset();
        Ok(())
    }

    pub fn get_best_frame(&self, session_id: &str) -> Result<Option<BestFrame>> {
        let handle = self.sessions.get(session_id)?;
        let best = lock_session(&handle)?.get_best();
        Ok(best)
    }

    pub fn best_frame_report(&self, session_id: &str) -> Result<Option<BestFrameReport>> {
        Ok(self
            .get_best_frame(session_id)?
            .as_ref()
            .map(BestFrameReport::new))
    }

    pub fn session_state(&self, session_id: &str) -> Result<SessionState> {
        let handle = self.sessions.get(session_id)?;
        let state = lock_session(&handle)?.state();
        Ok(state)
    }
}
