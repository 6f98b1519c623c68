//! Fixed-point rounding for derived aggregates.

/// Rounds `value` to `digits` decimal places, half away from zero.
///
/// Computed as `round(value * 10^digits) / 10^digits`; precision is bounded by
/// what `f64` can represent, so very large magnitudes lose digits first.
pub fn fixed_precision(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}
