mod math;
mod sad;


use std::num::NonZeroUsize;

pub use math::{denormalize_sample, normalize_sample, quantize_unit};
pub use sad::get_sad;

#[cfg(target_arch = "x86_64")]
cpufeatures::new!(cpuid_avx2, "avx2");

#[cfg(target_arch = "x86_64")]
pub use cpuid_avx2::get as has_avx2;

/// Moves `origin` by `offset` along an axis of length `len`, wrapping around
/// the edges.
///
/// This is a true modulo: the result always lies in `0..len`, including for
/// negative offsets larger than `origin`.
#[must_use]
pub fn wrap_coord(origin: usize, offset: isize, len: NonZeroUsize) -> usize {
    let len = len.get() as isize;
    (origin as isize + offset).rem_euclid(len) as usize
}

/// Performs a strided rectangular copy (bitblt) between sample buffers.
///
/// Copies `height` rows of `row_size` samples from `src` to `dest`, where each
/// buffer advances by its own stride between rows. When both strides equal
/// the row size, the whole region is copied in a single pass.
///
/// # Parameters
/// - `dest`: Destination buffer, starting at the first sample to overwrite
/// - `dest_stride`: Number of samples per row in the destination buffer
/// - `src`: Source buffer, starting at the first sample to read
/// - `src_stride`: Number of samples per row in the source buffer
/// - `row_size`: Number of samples to copy per row
/// - `height`: Number of rows to copy
pub fn vs_bitblt<T: Copy>(
    dest: &mut [T],
    dest_stride: NonZeroUsize,
    src: &[T],
    src_stride: NonZeroUsize,
    row_size: NonZeroUsize,
    height: NonZeroUsize,
) {
    let height = height.get();
    let row_size = row_size.get();
    let src_stride = src_stride.get();
    let dest_stride = dest_stride.get();

    if src_stride == dest_stride && src_stride == row_size {
        // Fast path: single copy when strides match row size
        dest[..row_size * height].copy_from_slice(&src[..row_size * height]);
    } else {
        for i in 0..height {
            let src_start = i * src_stride;
            let dest_start = i * dest_stride;
            dest[dest_start..dest_start + row_size]
                .copy_from_slice(&src[src_start..src_start + row_size]);
        }
    }
}
