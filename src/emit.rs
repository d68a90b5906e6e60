//! JSON packaging of per-frame results and best-frame snapshots.
//!
//! Reports never carry pixels. A best frame is identified by its SHA-256
//! digest; the encoded image is produced separately (`jpeg` feature).

use serde::Serialize;

use crate::coverage::CoverageValidationResult;
use crate::frame::FrameQualityMetrics;
use crate::pipeline::DetectionResult;
use crate::pose::Skeleton;
use crate::rect::Rectangle;
use crate::scoring::ConfidenceBreakdown;
use crate::session::BestFrame;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RectangleReport {
    #[serde(flatten)]
    pub rectangle: Rectangle,
    /// Rectangle area over frame area.
    pub area_ratio: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameReport<'a> {
    pub frame_number: u64,
    pub timestamp: f64,
    pub confidence: f32,
    pub accepted: bool,
    pub frame_width: u32,
    pub frame_height: u32,
    pub rectangles: Vec<RectangleReport>,
    pub skeleton: Option<&'a Skeleton>,
    pub quality: FrameQualityMetrics,
    pub coverage: Option<&'a CoverageValidationResult>,
    pub breakdown: ConfidenceBreakdown,
}

impl<'a> FrameReport<'a> {
    pub fn new(result: &'a DetectionResult) -> Self {
        let rectangles = result
            .rectangles
            .iter()
            .map(|r| RectangleReport {
                rectangle: *r,
                area_ratio: r.area_ratio(result.frame_width, result.frame_height),
            })
            .collect();
        Self {
            frame_number: result.frame_number,
            timestamp: result.timestamp,
            confidence: result.confidence,
            accepted: result.accepted,
            frame_width: result.frame_width,
            frame_height: result.frame_height,
            rectangles,
            skeleton: result.skeleton.as_ref(),
            quality: result.quality,
            coverage: result.coverage.as_ref(),
            breakdown: result.breakdown,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BestFrameReport {
    pub confidence: f32,
    pub frame_number: u64,
    pub width: u32,
    pub height: u32,
    /// Hex SHA-256 of dimensions and pixels.
    pub digest: String,
}

impl BestFrameReport {
    pub fn new(best: &BestFrame) -> Self {
        Self {
            confidence: best.confidence,
            frame_number: best.frame_number,
            width: best.frame.width,
            height: best.frame.height,
            digest: hex::encode(best.frame.digest()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub const JPEG_QUALITY: u8 = 85;

/// Encode the retained frame as JPEG.
#[cfg(feature = "jpeg")]
pub fn encode_jpeg(best: &BestFrame) -> crate::error::Result<Vec<u8>> {
    use image::codecs::jpeg::JpegEncoder;

    let frame = &best.frame;
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(
            frame.rgb(),
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| crate::error::FrameGateError::Encode(format!("jpeg: {}", e)))?;
    Ok(out)
}
