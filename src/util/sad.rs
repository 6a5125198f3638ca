#[cfg(target_arch = "x86_64")]
mod avx2;
mod rust;


use std::num::NonZeroUsize;

use cfg_if::cfg_if;

/// Sum of absolute differences between two rectangular regions of byte samples.
///
/// `width` counts samples, not pixels: for interleaved frames it is the block
/// width multiplied by the channel count. Any width and height are accepted,
/// which covers clamped blocks at the frame edges.
///
/// # Parameters
/// - `width`: Number of samples per row to compare
/// - `height`: Number of rows to compare
/// - `src`: First region, starting at its top-left sample
/// - `src_pitch`: Number of samples per row in the `src` buffer
/// - `ref_`: Second region, starting at its top-left sample
/// - `ref_pitch`: Number of samples per row in the `ref_` buffer
#[must_use]
pub fn get_sad(
    width: NonZeroUsize,
    height: NonZeroUsize,
    src: &[u8],
    src_pitch: NonZeroUsize,
    ref_: &[u8],
    ref_pitch: NonZeroUsize,
) -> u64 {
    cfg_if! {
        if #[cfg(all(target_arch = "x86_64", not(feature = "no_simd")))] {
            if crate::util::has_avx2() {
                // SAFETY: We check for AVX2 first
                return unsafe { avx2::get_sad(width, height, src, src_pitch, ref_, ref_pitch) };
            }
        }
    }

    rust::get_sad(width, height, src, src_pitch, ref_, ref_pitch)
}
