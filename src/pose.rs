//! Named body landmarks (33-point BlazePose topology) and the per-person skeleton.

use serde::Serialize;

macro_rules! landmark_names {
    ($($variant:ident = $index:literal => $name:literal,)+) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum LandmarkName {
            $($variant,)+
        }

        impl LandmarkName {
            pub const ALL: &'static [LandmarkName] = &[$(LandmarkName::$variant,)+];

            pub fn from_index(index: usize) -> Option<Self> {
                match index {
                    $($index => Some(LandmarkName::$variant),)+
                    _ => None,
                }
            }

            pub fn index(self) -> usize {
                match self {
                    $(LandmarkName::$variant => $index,)+
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(LandmarkName::$variant => $name,)+
                }
            }
        }
    };
}

landmark_names! {
    Nose = 0 => "nose",
    LeftEyeInner = 1 => "left_eye_inner",
    LeftEye = 2 => "left_eye",
    LeftEyeOuter = 3 => "left_eye_outer",
    RightEyeInner = 4 => "right_eye_inner",
    RightEye = 5 => "right_eye",
    RightEyeOuter = 6 => "right_eye_outer",
    LeftEar = 7 => "left_ear",
    RightEar = 8 => "right_ear",
    MouthLeft = 9 => "mouth_left",
    MouthRight = 10 => "mouth_right",
    LeftShoulder = 11 => "left_shoulder",
    RightShoulder = 12 => "right_shoulder",
    LeftElbow = 13 => "left_elbow",
    RightElbow = 14 => "right_elbow",
    LeftWrist = 15 => "left_wrist",
    RightWrist = 16 => "right_wrist",
    LeftPinky = 17 => "left_pinky",
    RightPinky = 18 => "right_pinky",
    LeftIndex = 19 => "left_index",
    RightIndex = 20 => "right_index",
    LeftThumb = 21 => "left_thumb",
    RightThumb = 22 => "right_thumb",
    LeftHip = 23 => "left_hip",
    RightHip = 24 => "right_hip",
    LeftKnee = 25 => "left_knee",
    RightKnee = 26 => "right_knee",
    LeftAnkle = 27 => "left_ankle",
    RightAnkle = 28 => "right_ankle",
    LeftHeel = 29 => "left_heel",
    RightHeel = 30 => "right_heel",
    LeftFootIndex = 31 => "left_foot_index",
    RightFootIndex = 32 => "right_foot_index",
}

impl std::fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single landmark in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Landmark {
    pub id: usize,
    pub name: LandmarkName,
    /// 0.0..=1.0 across the frame width.
    pub x: f32,
    /// 0.0..=1.0 down the frame height.
    pub y: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(name: LandmarkName, x: f32, y: f32, visibility: f32) -> Self {
        Self {
            id: name.index(),
            name,
            x,
            y,
            visibility,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// Landmarks for one detected person, ordered by landmark id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Skeleton {
    pub landmarks: Vec<Landmark>,
}

impl Skeleton {
    pub fn new(mut landmarks: Vec<Landmark>) -> Self {
        landmarks.sort_by_key(|l| l.id);
        landmarks.dedup_by_key(|l| l.id);
        Self { landmarks }
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks
            .binary_search_by_key(&name.index(), |l| l.id)
            .ok()
            .map(|i| &self.landmarks[i])
    }

    /// True when the landmark exists and its visibility exceeds `threshold`.
    pub fn is_visible(&self, name: LandmarkName, threshold: f32) -> bool {
        self.get(name).is_some_and(|l| l.is_visible(threshold))
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}
