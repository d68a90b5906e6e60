//! Axis-aligned detector rectangles in pixel space.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RectLabel {
    Face,
    Body,
    UpperBody,
}

impl RectLabel {
    /// Body and upper-body rectangles both count as body evidence.
    pub fn is_body(self) -> bool {
        matches!(self, RectLabel::Body | RectLabel::UpperBody)
    }

    /// Confidence assumed when the detector reports none.
    pub fn default_confidence(self) -> f32 {
        match self {
            RectLabel::Face => 0.8,
            RectLabel::Body | RectLabel::UpperBody => 0.75,
        }
    }
}

/// Top-left origin, pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: RectLabel,
    pub source_confidence: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32, label: RectLabel) -> Self {
        Self {
            x,
            y,
            width,
            height,
            label,
            source_confidence: label.default_confidence(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.source_confidence = confidence;
        self
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area of the axis-aligned intersection with `other`.
    pub fn intersection_area(&self, other: &Rectangle) -> f32 {
        let x_overlap = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let y_overlap = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        x_overlap * y_overlap
    }

    /// Intersection over the smaller of the two areas. Zero when either is empty.
    pub fn overlap_ratio(&self, other: &Rectangle) -> f32 {
        safe_ratio(
            self.intersection_area(other),
            self.area().min(other.area()),
        )
    }

    /// Height over width, 0 for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> f32 {
        safe_ratio(self.height, self.width)
    }

    /// Fraction of the frame this rectangle covers.
    pub fn area_ratio(&self, frame_width: u32, frame_height: u32) -> f32 {
        safe_ratio(self.area(), frame_width as f32 * frame_height as f32)
    }
}

/// `num / den`, defined as 0 when the denominator is not positive.
pub(crate) fn safe_ratio(num: f32, den: f32) -> f32 {
    if den > 0.0 && num.is_finite() {
        num / den
    } else {
        0.0
    }
}

/// Largest rectangle (by area) among those matching `pred`. First wins on ties.
pub(crate) fn largest<'a>(
    rects: &'a [Rectangle],
    pred: impl Fn(&Rectangle) -> bool,
) -> Option<&'a Rectangle> {
    rects.iter().filter(|r| pred(r)).fold(None, |best, r| match best {
        Some(b) if b.area() >= r.area() => Some(b),
        _ => Some(r),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_ratio_uses_smaller_area() {
        let big = Rectangle::new(0.0, 0.0, 100.0, 100.0, RectLabel::Body);
        let inner = Rectangle::new(10.0, 10.0, 20.0, 20.0, RectLabel::Body);
        assert_eq!(big.overlap_ratio(&inner), 1.0);
        assert_eq!(inner.overlap_ratio(&big), 1.0);
    }

    #[test]
    fn disjoint_rectangles_do_not_overlap() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0, RectLabel::Face);
        let b = Rectangle::new(20.0, 20.0, 10.0, 10.0, RectLabel::Face);
        assert_eq!(a.overlap_ratio(&b), 0.0);
    }

    #[test]
    fn degenerate_rectangle_ratios_are_zero() {
        let flat = Rectangle::new(0.0, 0.0, 0.0, 10.0, RectLabel::Body);
        let other = Rectangle::new(0.0, 0.0, 10.0, 10.0, RectLabel::Body);
        assert_eq!(flat.aspect_ratio(), 0.0);
        assert_eq!(flat.overlap_ratio(&other), 0.0);
        assert_eq!(other.area_ratio(0, 0), 0.0);
    }

    #[test]
    fn largest_prefers_first_on_tie() {
        let rects = [
            Rectangle::new(0.0, 0.0, 10.0, 10.0, RectLabel::Face),
            Rectangle::new(50.0, 0.0, 10.0, 10.0, RectLabel::Face),
            Rectangle::new(0.0, 0.0, 30.0, 30.0, RectLabel::Body),
        ];
        let face = largest(&rects, |r| r.label == RectLabel::Face).unwrap();
        assert_eq!(face.x, 0.0);
        let body = largest(&rects, |r| r.label.is_body()).unwrap();
        assert_eq!(body.width, 30.0);
    }
}
