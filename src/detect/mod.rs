pub mod adapter;
mod backend;
mod backends;
mod result;

pub use adapter::{adapt, adapt_rectangles, adapt_skeleton, parse_label, LANDMARK_VISIBILITY_FLOOR};
pub use backend::{PoseEstimator, RectangleDetector};
pub use backends::{ScriptStep, ScriptedDetector, SyntheticPerson};
pub use result::{RawLandmark, RawRectangle, RawSkeleton};
