use anyhow::Result;

use super::result::{RawRectangle, RawSkeleton};

/// External face/body rectangle detector.
///
/// # Boundary
///
/// Implementations receive RGB24 pixels borrowed for the duration of one call.
/// They must not retain the slice. Output need not be deterministic across
/// identical input (live detectors warm up).
pub trait RectangleDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Detect zero or more labeled rectangles.
    fn detect_rectangles(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<RawRectangle>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// External single-person pose estimator.
pub trait PoseEstimator: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Estimate landmarks. `Ok(None)` when no subject is in view.
    fn estimate_pose(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<RawSkeleton>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
