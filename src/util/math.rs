
/// Port of C's `nearbyintf` function which rounds `.5` values to the nearest even number.
/// This is also what numpy's `round` does, so quantized frames match byte for byte.
#[must_use]
pub fn round_ties_to_even(x: f32) -> f32 {
    let truncated = x.trunc();
    let fractional = x - truncated;

    match fractional.abs() {
        f if f < 0.5 => truncated,
        f if f > 0.5 => truncated + x.signum(),
        _ => {
            if truncated as i32 % 2 == 0 {
                truncated
            } else {
                truncated + x.signum()
            }
        }
    }
}

/// Maps a `[0, 1]` sample to a byte. Out of range values are clamped first.
#[must_use]
pub fn quantize_unit(x: f32) -> u8 {
    if x.is_nan() {
        return 0;
    }
    round_ties_to_even(x.clamp(0.0, 1.0) * 255.0) as u8
}

/// Converts an integer sample of the given bit depth to `[0, 1]`.
#[must_use]
pub fn normalize_sample(value: u32, bits_per_sample: u8) -> f32 {
    let max = ((1u64 << bits_per_sample) - 1) as f32;
    (value as f32 / max).clamp(0.0, 1.0)
}

/// Converts a `[0, 1]` sample back to an integer sample of the given bit depth.
#[must_use]
pub fn denormalize_sample(x: f32, bits_per_sample: u8) -> u32 {
    if x.is_nan() {
        return 0;
    }
    let max = ((1u64 << bits_per_sample) - 1) as f32;
    round_ties_to_even(x.clamp(0.0, 1.0) * max) as u32
}
