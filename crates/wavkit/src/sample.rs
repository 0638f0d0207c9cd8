//! Pure per-sample operations: bit-depth rescaling, channel folding, and
//! volume scaling.
//!
//! These are the two composable stages behind the conversion matrix in
//! [`crate::convert`]: channel remap first, then bit-depth rescale. The
//! rounding behavior is deliberately asymmetric and must stay that way:
//! channel averaging truncates, bit-depth rescaling rounds.

/// Maximum representable magnitude for a bit depth, positive branch.
fn depth_max(bits: u16) -> i32 {
    match bits {
        8 => i8::MAX as i32,
        _ => i16::MAX as i32,
    }
}

/// Maximum representable magnitude for a bit depth, negative branch.
///
/// Signed ranges are asymmetric (-128..127), so the negative branch
/// scales against the minimum rather than the negated maximum.
fn depth_min(bits: u16) -> i32 {
    match bits {
        8 => i8::MIN as i32,
        _ => i16::MIN as i32,
    }
}

/// Rescales a sample value between bit depths using proportional scaling.
///
/// The positive branch maps `0..=from_max` onto `0..=to_max` and the
/// negative branch maps `from_min..0` onto `to_min..0`, each with
/// `round()`. Zero maps to zero. Equal depths pass through unchanged.
pub fn rescale(value: i32, from_bits: u16, to_bits: u16) -> i32 {
    if from_bits == to_bits || value == 0 {
        return value;
    }
    let (from, to) = if value > 0 {
        (depth_max(from_bits), depth_max(to_bits))
    } else {
        (depth_min(from_bits), depth_min(to_bits))
    };
    (value as f64 / from as f64 * to as f64).round() as i32
}

/// Scales an 8-bit sample up to 16 bits.
pub fn scale_8_to_16(value: i8) -> i16 {
    rescale(value as i32, 8, 16) as i16
}

/// Scales a 16-bit sample down to 8 bits.
pub fn scale_16_to_8(value: i16) -> i8 {
    rescale(value as i32, 16, 8) as i8
}

/// Folds a stereo pair into one mono sample by averaging.
///
/// Uses truncating integer division, not rounding.
pub fn fold_stereo_pair(first: i32, second: i32) -> i32 {
    (first + second) / 2
}

/// Applies a volume multiplier to a sample value, rounding the result.
///
/// Callers skip this entirely when the multiplier is exactly 1.0 to
/// avoid spurious rounding.
pub fn apply_multiplier(value: i32, multiplier: f64) -> i32 {
    (value as f64 * multiplier).round() as i32
}

/// Clamps a sample value into the representable range of a bit depth.
pub fn clamp_to_depth(value: i32, bits: u16) -> i32 {
    value.clamp(depth_min(bits), depth_max(bits))
}
