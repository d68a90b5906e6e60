use serde::Deserialize;

/// Rectangle exactly as an external detector reports it.
///
/// Labels are free-form strings (cascade or model class names); the adapter
/// maps them onto `RectLabel`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawRectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl RawRectangle {
    pub fn new(label: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            label: label.to_string(),
            confidence: None,
        }
    }
}

/// Landmark output of a pose estimator, normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RawLandmark {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawSkeleton {
    pub landmarks: Vec<RawLandmark>,
}
