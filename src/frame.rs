//! Raw frame isolation layer.
//!
//! - `RawFrame`: validated RGB24 pixel buffer. Bytes are private and zeroized on drop.
//! - `InferenceView`: restricted view handed to detectors. Pixels flow in, only
//!   detections flow out.
//! - `FrameQualityMetrics`: brightness/contrast derived from luma, no detector involved.
//!
//! Every input format is normalized to RGB24 at construction, so downstream code
//! (detectors, quality metrics, best-frame retention) sees one layout.

use serde::Serialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::detect::{PoseEstimator, RawRectangle, RawSkeleton, RectangleDetector};
use crate::error::{FrameGateError, Result};

/// Pixel layouts accepted at the ingestion boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Nv12,
    Gray8,
}

// ----------------------------------------------------------------------------
// RawFrame
// ----------------------------------------------------------------------------

/// Decoded frame. There is no `Clone`, no `Serialize`, no `AsRef<[u8]>`.
///
/// The session tracker retains the best frame by moving it behind an `Arc`;
/// a promotion swaps the whole `Arc`, so a retained buffer is never mutated.
///
/// ```compile_fail
/// use framegate::{PixelFormat, RawFrame};
/// let frame = RawFrame::from_pixels(&[0; 3], 1, 1, PixelFormat::Rgb24).unwrap();
/// let _copy = frame.clone();
/// ```
///
/// ```compile_fail
/// use framegate::{PixelFormat, RawFrame};
/// let frame = RawFrame::from_pixels(&[0; 3], 1, 1, PixelFormat::Rgb24).unwrap();
/// let _json = serde_json::to_string(&frame);
/// ```
///
/// ```compile_fail
/// use framegate::{PixelFormat, RawFrame};
/// let frame = RawFrame::from_pixels(&[0; 3], 1, 1, PixelFormat::Rgb24).unwrap();
/// let _bytes = frame.data;
/// ```
pub struct RawFrame {
    /// RGB24, row-major, `width * height * 3` bytes.
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawFrame {
    /// Validate and normalize raw pixels into an RGB24 frame.
    pub fn from_pixels(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameGateError::invalid_frame(format!(
                "frame dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let data = normalize_to_rgb(pixels, width, height, format)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Decode a JPEG (or any format the `image` crate was built with).
    #[cfg(feature = "jpeg")]
    pub fn decode_jpeg(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FrameGateError::invalid_frame(format!("decode jpeg: {}", e)))?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_pixels(rgb.as_raw(), width, height, PixelFormat::Rgb24)
    }

    /// Detectors get a restricted view, never the frame itself.
    pub fn inference_view(&self) -> InferenceView<'_> {
        InferenceView { frame: self }
    }

    /// Grayscale intensities using BT.601 weights.
    pub fn luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|px| {
                let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                clamp_to_u8(y)
            })
            .collect()
    }

    /// Quality metrics, optionally after histogram equalization of the luma plane.
    pub fn quality(&self, equalize: bool) -> FrameQualityMetrics {
        let mut luma = self.luma();
        if equalize {
            equalize_histogram(&mut luma);
        }
        FrameQualityMetrics::from_luma(&luma)
    }

    /// SHA-256 over dimensions and pixels. Identifies a frame without exposing it.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.data);
        hasher.finalize().into()
    }

    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }

    #[cfg(any(feature = "jpeg", test))]
    pub(crate) fn rgb(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// InferenceView
// ----------------------------------------------------------------------------

/// Read-only handle used to run external detectors on a frame.
pub struct InferenceView<'a> {
    frame: &'a RawFrame,
}

impl<'a> InferenceView<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    /// Run a rectangle detector. The detector borrows the RGB24 pixels for the
    /// duration of the call only.
    pub fn run_rectangle_detector(
        &self,
        detector: &mut dyn RectangleDetector,
    ) -> anyhow::Result<Vec<RawRectangle>> {
        detector.detect_rectangles(&self.frame.data, self.frame.width, self.frame.height)
    }

    /// Run a pose estimator. `Ok(None)` means no subject was found.
    pub fn run_pose_estimator(
        &self,
        estimator: &mut dyn PoseEstimator,
    ) -> anyhow::Result<Option<RawSkeleton>> {
        estimator.estimate_pose(&self.frame.data, self.frame.width, self.frame.height)
    }
}

// ----------------------------------------------------------------------------
// Quality metrics
// ----------------------------------------------------------------------------

/// Brightness is mean luma, contrast is the population standard deviation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FrameQualityMetrics {
    pub brightness: f32,
    pub contrast: f32,
}

impl FrameQualityMetrics {
    pub fn new(brightness: f32, contrast: f32) -> Self {
        Self {
            brightness,
            contrast,
        }
    }

    pub fn from_luma(luma: &[u8]) -> Self {
        if luma.is_empty() {
            return Self::default();
        }
        let n = luma.len() as f64;
        let mean = luma.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = luma
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self {
            brightness: mean as f32,
            contrast: variance.sqrt() as f32,
        }
    }
}

/// In-place histogram equalization of an 8-bit plane.
///
/// A plane with a single intensity is left untouched.
pub fn equalize_histogram(plane: &mut [u8]) {
    if plane.is_empty() {
        return;
    }
    let mut histogram = [0u64; 256];
    for &v in plane.iter() {
        histogram[v as usize] += 1;
    }
    let total = plane.len() as u64;
    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (i, count) in histogram.iter().enumerate() {
        running += count;
        cdf[i] = running;
    }
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total == cdf_min {
        return;
    }
    let scale = 255.0 / (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let mapped = (cdf[i].saturating_sub(cdf_min)) as f64 * scale;
        *slot = mapped.round().clamp(0.0, 255.0) as u8;
    }
    for v in plane.iter_mut() {
        *v = lut[*v as usize];
    }
}

// ----------------------------------------------------------------------------
// Normalization
// ----------------------------------------------------------------------------

fn normalize_to_rgb(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<Vec<u8>> {
    let plane = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| FrameGateError::invalid_frame("frame dimensions overflow"))?;
    match format {
        PixelFormat::Rgb24 => {
            let expected = plane
                .checked_mul(3)
                .ok_or_else(|| FrameGateError::invalid_frame("RGB frame dimensions overflow"))?;
            check_len("RGB", pixels.len(), expected)?;
            Ok(pixels.to_vec())
        }
        PixelFormat::Gray8 => {
            check_len("gray", pixels.len(), plane)?;
            Ok(pixels.iter().flat_map(|&v| [v, v, v]).collect())
        }
        PixelFormat::Nv12 => nv12_to_rgb(pixels, width as usize, height as usize, plane),
    }
}

fn check_len(kind: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(FrameGateError::invalid_frame(format!(
            "{} frame length mismatch: expected {}, got {}",
            kind, expected, actual
        )));
    }
    Ok(())
}

/// NV12 is a full-size luma plane followed by one interleaved U/V pair per
/// 2x2 block of pixels.
fn nv12_to_rgb(pixels: &[u8], w: usize, h: usize, y_plane: usize) -> Result<Vec<u8>> {
    if w % 2 != 0 || h % 2 != 0 {
        return Err(FrameGateError::invalid_frame(format!(
            "NV12 frames need even dimensions, got {}x{}",
            w, h
        )));
    }
    let expected = y_plane
        .checked_add(y_plane / 2)
        .ok_or_else(|| FrameGateError::invalid_frame("NV12 frame dimensions overflow"))?;
    check_len("NV12", pixels.len(), expected)?;

    let (luma, chroma) = pixels.split_at(y_plane);
    let mut rgb = Vec::with_capacity(y_plane * 3);
    for (row, luma_row) in luma.chunks_exact(w).enumerate() {
        let chroma_row = &chroma[(row / 2) * w..][..w];
        for (col, &y) in luma_row.iter().enumerate() {
            let pair = col & !1;
            rgb.extend_from_slice(&yuv_to_rgb(y, chroma_row[pair], chroma_row[pair + 1]));
        }
    }
    Ok(rgb)
}

/// Full-range BT.601.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = f32::from(y);
    let u = f32::from(u) - 128.0;
    let v = f32::from(v) - 128.0;
    [
        clamp_to_u8(y + 1.402 * v),
        clamp_to_u8(y - 0.344_136 * u - 0.714_136 * v),
        clamp_to_u8(y + 1.772 * u),
    ]
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
