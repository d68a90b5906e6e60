use crate::rect::Rectangle;

/// Overlap threshold for face rectangles.
pub const FACE_OVERLAP_THRESHOLD: f32 = 0.5;
/// Overlap threshold for body and upper-body rectangles.
pub const BODY_OVERLAP_THRESHOLD: f32 = 0.7;

/// Remove near-duplicate rectangles.
///
/// Candidates are visited in input order. A candidate is dropped when its
/// overlap ratio (intersection over the smaller area) with any already-accepted
/// rectangle exceeds `overlap_threshold`. First occurrence wins.
pub fn dedupe(rects: &[Rectangle], overlap_threshold: f32) -> Vec<Rectangle> {
    let mut accepted: Vec<Rectangle> = Vec::with_capacity(rects.len());
    for candidate in rects {
        let duplicate = accepted
            .iter()
            .any(|kept| candidate.overlap_ratio(kept) > overlap_threshold);
        if !duplicate {
            accepted.push(*candidate);
        }
    }
    accepted
}

/// Dedupe faces among faces and bodies among bodies (full and upper body pooled),
/// returning faces first, then bodies.
pub fn dedupe_by_class(
    rects: &[Rectangle],
    face_threshold: f32,
    body_threshold: f32,
) -> Vec<Rectangle> {
    let (bodies, faces): (Vec<Rectangle>, Vec<Rectangle>) =
        rects.iter().partition(|r| r.label.is_body());
    let mut out = dedupe(&faces, face_threshold);
    out.extend(dedupe(&bodies, body_threshold));
    out
}
