use std::f64::consts::PI;

/// Tolerance for "two directions are the same" comparisons, roughly a
/// thousandth of a degree.
pub const ANGLE_EPSILON: u32 = 1 << 13;

const BAMS_SCALE: f64 = (1u64 << 32) as f64 / (2.0 * PI);

/// `atan2` in binary angle measurement: a full turn maps to the full `u32`
/// range, so angle arithmetic wraps for free and comparisons are exact.
pub fn bams_atan2(y: f64, x: f64) -> u32 {
    let mut radians = y.atan2(x);
    if radians < 0.0 {
        radians += 2.0 * PI;
    }
    (radians * BAMS_SCALE) as u64 as u32
}

/// Absolute angular difference, accounting for wrap-around.
pub fn bams_distance(a: u32, b: u32) -> u32 {
    let forward = a.wrapping_sub(b);
    let backward = b.wrapping_sub(a);
    forward.min(backward)
}
