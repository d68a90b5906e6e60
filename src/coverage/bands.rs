//! Piecewise scoring bands shared by both coverage strategies and the scorer.
//! All bands are inclusive at their edges.

/// Horizontal offset at which centering credit reaches zero.
const CENTERING_FALLOFF: f32 = 0.2;
/// Edge band (fraction of frame height) that costs margin credit.
const EDGE_MARGIN: f32 = 0.05;
const MARGIN_PENALTY: f32 = 0.3;

/// 1.0 when `center_x` (normalized) is at 0.5, falling linearly to 0 at ±0.2.
pub fn centering_score(center_x: f32) -> f32 {
    if !center_x.is_finite() {
        return 0.0;
    }
    1.0 - ((center_x - 0.5).abs() / CENTERING_FALLOFF).min(1.0)
}

/// Body height as a fraction of frame height. Full credit for 0.5-0.8, half for
/// 0.4-0.85, nothing outside.
pub fn size_band_score(height_ratio: f32) -> f32 {
    if (0.5..=0.8).contains(&height_ratio) {
        1.0
    } else if (0.4..=0.85).contains(&height_ratio) {
        0.5
    } else {
        0.0
    }
}

/// Body area as a fraction of frame area (rectangle strategy).
pub fn area_band_score(area_ratio: f32) -> f32 {
    if (0.2..=0.6).contains(&area_ratio) {
        1.0
    } else if (0.15..=0.7).contains(&area_ratio) {
        0.7
    } else {
        0.3
    }
}

/// Penalize a bounding box that touches the top or bottom 5% of the frame.
/// `top` and `bottom` are normalized to frame height.
pub fn margin_score(top: f32, bottom: f32) -> f32 {
    let mut score = 1.0;
    if top < EDGE_MARGIN {
        score -= MARGIN_PENALTY;
    }
    if bottom > 1.0 - EDGE_MARGIN {
        score -= MARGIN_PENALTY;
    }
    score
}

/// Height over width of a standing person.
pub fn aspect_band_score(aspect_ratio: f32) -> f32 {
    if (1.5..=3.0).contains(&aspect_ratio) {
        1.0
    } else if (1.2..=4.0).contains(&aspect_ratio) {
        0.7
    } else {
        0.3
    }
}

/// Weighted positioning score: centering 0.3, size 0.3, margin 0.2, aspect 0.2.
pub(crate) fn positioning(centering: f32, size: f32, margin: f32, aspect: f32) -> f32 {
    (centering * 0.3 + size * 0.3 + margin * 0.2 + aspect * 0.2).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_band_edges_get_full_credit() {
        assert_eq!(size_band_score(0.5), 1.0);
        assert_eq!(size_band_score(0.8), 1.0);
        assert_eq!(size_band_score(0.65), 1.0);
    }

    #[test]
    fn size_band_just_outside_gets_reduced_credit() {
        assert_eq!(size_band_score(0.49), 0.5);
        assert_eq!(size_band_score(0.81), 0.5);
        assert_eq!(size_band_score(0.4), 0.5);
        assert_eq!(size_band_score(0.85), 0.5);
    }

    #[test]
    fn size_band_far_outside_scores_zero() {
        assert_eq!(size_band_score(0.39), 0.0);
        assert_eq!(size_band_score(0.86), 0.0);
        assert_eq!(size_band_score(0.0), 0.0);
        assert_eq!(size_band_score(f32::NAN), 0.0);
    }

    #[test]
    fn centering_decays_linearly() {
        assert_eq!(centering_score(0.5), 1.0);
        assert!((centering_score(0.6) - 0.5).abs() < 1e-6);
        assert_eq!(centering_score(0.75), 0.0);
        assert_eq!(centering_score(0.2), 0.0);
    }

    #[test]
    fn margins_penalize_each_edge() {
        assert_eq!(margin_score(0.1, 0.9), 1.0);
        assert!((margin_score(0.01, 0.9) - 0.7).abs() < 1e-6);
        assert!((margin_score(0.01, 0.99) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn aspect_and_area_bands() {
        assert_eq!(aspect_band_score(2.0), 1.0);
        assert_eq!(aspect_band_score(1.3), 0.7);
        assert_eq!(aspect_band_score(0.5), 0.3);
        assert_eq!(area_band_score(0.3), 1.0);
        assert_eq!(area_band_score(0.65), 0.7);
        assert_eq!(area_band_score(0.05), 0.3);
    }
}
