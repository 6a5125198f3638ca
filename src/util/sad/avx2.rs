#![allow(clippy::undocumented_unsafe_blocks)]
#![allow(unsafe_op_in_unsafe_fn)]

use std::{arch::x86_64::*, num::NonZeroUsize};

#[must_use]
#[target_feature(enable = "avx2")]
pub(super) unsafe fn get_sad(
    width: NonZeroUsize,
    height: NonZeroUsize,
    src: &[u8],
    src_pitch: NonZeroUsize,
    ref_: &[u8],
    ref_pitch: NonZeroUsize,
) -> u64 {
    let width = width.get();
    let mut acc256 = _mm256_setzero_si256();
    let mut acc128 = _mm_setzero_si128();
    let mut tail = 0u64;

    for y in 0..height.get() {
        // Slicing keeps the loads below in bounds.
        let src_row = &src[y * src_pitch.get()..][..width];
        let ref_row = &ref_[y * ref_pitch.get()..][..width];
        let src_ptr = src_row.as_ptr();
        let ref_ptr = ref_row.as_ptr();
        let mut i = 0;

        while i + 32 <= width {
            let a = _mm256_loadu_si256(src_ptr.add(i) as *const __m256i);
            let b = _mm256_loadu_si256(ref_ptr.add(i) as *const __m256i);
            acc256 = _mm256_add_epi64(acc256, _mm256_sad_epu8(a, b));
            i += 32;
        }

        if i + 16 <= width {
            let a = _mm_loadu_si128(src_ptr.add(i) as *const __m128i);
            let b = _mm_loadu_si128(ref_ptr.add(i) as *const __m128i);
            acc128 = _mm_add_epi64(acc128, _mm_sad_epu8(a, b));
            i += 16;
        }

        if i + 8 <= width {
            let a = _mm_loadl_epi64(src_ptr.add(i) as *const __m128i);
            let b = _mm_loadl_epi64(ref_ptr.add(i) as *const __m128i);
            acc128 = _mm_add_epi64(acc128, _mm_sad_epu8(a, b));
            i += 8;
        }

        for (&s, &r) in src_row[i..].iter().zip(&ref_row[i..]) {
            tail += u64::from(s.abs_diff(r));
        }
    }

    // Reduce acc256: add high and low 128-bit lanes
    let acc256_lo = _mm256_castsi256_si128(acc256);
    let acc256_hi = _mm256_extracti128_si256(acc256, 1);
    let combined = _mm_add_epi64(_mm_add_epi64(acc256_lo, acc256_hi), acc128);

    // Reduce 2x u64 lanes to scalar
    let high = _mm_unpackhi_epi64(combined, combined);
    let total = _mm_add_epi64(combined, high);
    _mm_cvtsi128_si64(total) as u64 + tail
}
