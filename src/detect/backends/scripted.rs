use anyhow::{anyhow, Result};

use crate::detect::backend::{PoseEstimator, RectangleDetector};
use crate::detect::result::{RawRectangle, RawSkeleton};

/// One step of a scripted detector run.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    Detections {
        rectangles: Vec<RawRectangle>,
        skeleton: Option<RawSkeleton>,
    },
    /// The external call fails for this frame.
    Failure(String),
}

impl ScriptStep {
    pub fn empty() -> Self {
        ScriptStep::Detections {
            rectangles: Vec::new(),
            skeleton: None,
        }
    }
}

/// Replays a fixed sequence of detector outputs, one step per call, cycling
/// when the script runs out. Used by tests and the demo binary.
///
/// Each trait keeps its own cursor, so a single instance can be registered as
/// both the rectangle detector and the pose estimator.
#[derive(Clone, Debug)]
pub struct ScriptedDetector {
    steps: Vec<ScriptStep>,
    rect_cursor: usize,
    pose_cursor: usize,
}

impl ScriptedDetector {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            rect_cursor: 0,
            pose_cursor: 0,
        }
    }

    /// Same output on every call.
    pub fn constant(rectangles: Vec<RawRectangle>, skeleton: Option<RawSkeleton>) -> Self {
        Self::new(vec![ScriptStep::Detections {
            rectangles,
            skeleton,
        }])
    }

    fn step(&self, cursor: usize) -> Option<&ScriptStep> {
        if self.steps.is_empty() {
            None
        } else {
            self.steps.get(cursor % self.steps.len())
        }
    }
}

impl RectangleDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect_rectangles(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<RawRectangle>> {
        let step = self.step(self.rect_cursor).cloned();
        self.rect_cursor += 1;
        match step {
            None => Ok(Vec::new()),
            Some(ScriptStep::Detections { rectangles, .. }) => Ok(rectangles),
            Some(ScriptStep::Failure(reason)) => Err(anyhow!("scripted failure: {}", reason)),
        }
    }
}

impl PoseEstimator for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn estimate_pose(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Option<RawSkeleton>> {
        let step = self.step(self.pose_cursor).cloned();
        self.pose_cursor += 1;
        match step {
            None => Ok(None),
            Some(ScriptStep::Detections { skeleton, .. }) => Ok(skeleton),
            Some(ScriptStep::Failure(reason)) => Err(anyhow!("scripted failure: {}", reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_detector_cycles_steps() {
        let mut detector = ScriptedDetector::new(vec![
            ScriptStep::Detections {
                rectangles: vec![RawRectangle::new("face", 0.0, 0.0, 10.0, 10.0)],
                skeleton: None,
            },
            ScriptStep::Failure("camera glitch".into()),
        ]);

        let r1 = detector.detect_rectangles(b"frame1", 1, 1).unwrap();
        assert_eq!(r1.len(), 1);
        assert!(detector.detect_rectangles(b"frame2", 1, 1).is_err());
        let r3 = detector.detect_rectangles(b"frame3", 1, 1).unwrap();
        assert_eq!(r3.len(), 1);
    }

    #[test]
    fn pose_cursor_is_independent() {
        let mut detector = ScriptedDetector::new(vec![ScriptStep::empty()]);
        assert!(detector.detect_rectangles(b"f", 1, 1).unwrap().is_empty());
        assert!(detector.estimate_pose(b"f", 1, 1).unwrap().is_none());
    }

    #[test]
    fn empty_script_yields_nothing() {
        let mut detector = ScriptedDetector::new(Vec::new());
        assert!(detector.detect_rectangles(b"f", 1, 1).unwrap().is_empty());
        assert!(detector.estimate_pose(b"f", 1, 1).unwrap().is_none());
    }
}
