//! Sentence-distance decay used by proximity counting.

/// Smallest weight any co-occurring pair receives.
pub const DECAY_FLOOR: f64 = 0.05;

/// Distance at which the log decay reaches zero (before the floor applies).
pub const DECAY_HORIZON: f64 = 4.0;

/// `1 + |a - b|`: adjacent mentions in one sentence are at distance 1.
pub fn sentence_distance(a: usize, b: usize) -> usize {
    1 + a.abs_diff(b)
}

/// Weight for a pair `distance` sentences apart:
/// `max(0.05, 1 - ln(distance) / ln(4))`. Distances below 1 count as 1.
pub fn scaled_distance(distance: usize) -> f64 {
    let distance = distance.max(1) as f64;
    (1.0 - distance.ln() / DECAY_HORIZON.ln()).max(DECAY_FLOOR)
}
