use std::num::NonZeroUsize;

#[must_use]
pub(super) fn get_sad(
    width: NonZeroUsize,
    height: NonZeroUsize,
    src: &[u8],
    src_pitch: NonZeroUsize,
    ref_: &[u8],
    ref_pitch: NonZeroUsize,
) -> u64 {
    let width = width.get();
    let mut sum = 0u64;
    for y in 0..height.get() {
        let src_row = &src[y * src_pitch.get()..][..width];
        let ref_row = &ref_[y * ref_pitch.get()..][..width];
        sum += src_row
            .iter()
            .zip(ref_row)
            .map(|(&s, &r)| u64::from(s.abs_diff(r)))
            .sum::<u64>();
    }
    sum
}
