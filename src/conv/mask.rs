use log::trace;

use crate::{error::{ConvError, Result}, partition::Partition, partitioner::{available_workers, Partitioner}};

use super::{padding::PaddingPolicy, params::ConvParams};

/// One flag per operator row: true when that row is a real convolution output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask {
    slots: Vec<bool>,
}

impl From<Vec<bool>> for Mask {
    fn from(slots: Vec<bool>) -> Self { Self { slots } }
}

impl Mask {
    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn slots(&self) -> &[bool] { &self.slots }

    /// Number of kept rows, the true output length.
    pub fn output_count(&self) -> usize {
        self.slots.iter().filter(|&&kept| kept).count()
    }

    /// Positions of kept rows in ascending order.
    pub fn kept_positions(&self) -> Vec<usize> {
        self.slots.iter().enumerate().filter_map(|(p, &kept)| kept.then_some(p)).collect()
    }
}

/// Inclusive range of key positions whose window fits inside the padded input.
fn candidate_range(
    input_len: usize,
    left_extent: usize,
    right_extent: usize,
    pad_left: usize,
    pad_right: usize,
) -> Option<(usize, usize)> {
    let first = left_extent.checked_sub(pad_left)?;
    let last = (input_len - 1 + pad_right).checked_sub(right_extent)?;
    (first <= last && first < input_len).then_some((first, last.min(input_len - 1)))
}

/// Builds the mask selecting which raw rows survive stride and padding.
/// `key_offset` is the dilated key offset, `effective_len` the dilated filter length.
pub fn build(
    input_len: usize,
    effective_len: usize,
    key_offset: usize,
    stride: usize,
    policy: PaddingPolicy,
) -> Result<Mask> {
    if input_len < 1 {
        return Err(ConvError::InvalidInputLength(input_len));
    }
    if stride < 1 {
        return Err(ConvError::InvalidStride(stride));
    }
    if effective_len < 1 {
        return Err(ConvError::EmptyFilter);
    }
    if key_offset >= effective_len {
        return Err(ConvError::InvalidKeyIndex { key: key_offset, filter_len: effective_len });
    }

    let left_extent = key_offset;
    let right_extent = effective_len - 1 - key_offset;
    policy.check_usable(left_extent, right_extent)?;

    let candidates = match policy {
        PaddingPolicy::Valid => candidate_range(input_len, left_extent, right_extent, 0, 0),
        PaddingPolicy::Explicit(pad_left, pad_right) =>
            candidate_range(input_len, left_extent, right_extent, pad_left, pad_right),
        // Padding is sized so every stride-aligned key from 0 is valid
        PaddingPolicy::Same => Some((0, input_len - 1)),
    };

    let slot_values = |partition: &Partition| {
        partition.range().map(|position| match candidates {
            Some((first, last)) => position >= first && position <= last && (position - first) % stride == 0,
            None => false,
        }).collect::<Vec<bool>>()
    };

    let slots = Partitioner::for_workload(input_len, available_workers()).parallelized(slot_values);
    let mask = Mask { slots };
    trace!("mask for {policy} over {input_len} rows keeps {}", mask.output_count());

    Ok(mask)
}

/// Mask for a validated parameter set.
pub fn build_for(params: &ConvParams) -> Result<Mask> {
    build(
        params.input_len(),
        params.effective_len(),
        params.filter().left_extent(),
        params.stride(),
        params.padding())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(mask: &Mask) -> String {
        mask.slots().iter().map(|&kept| if kept { 'T' } else { 'F' }).collect()
    }

    #[test]
    fn test_valid_stride_two() {
        // N=10, filter of 5 keyed on 2: keys 2..=7 fit, every other one kept
        let actual = build(10, 5, 2, 2, PaddingPolicy::Valid).unwrap();

        assert_eq!(flags(&actual), "FFTFTFTFFF");
        assert_eq!(actual.output_count(), 3);
        assert_eq!(actual.output_count(), PaddingPolicy::Valid.output_len(10, 5, 2));
    }

    #[test]
    fn test_valid_filter_longer_than_input() {
        let actual = build(4, 5, 2, 1, PaddingPolicy::Valid).unwrap();

        assert_eq!(flags(&actual), "FFFF");
        assert_eq!(actual.output_count(), 0);
    }

    #[test]
    fn test_same() {
        let actual = build(10, 5, 2, 3, PaddingPolicy::Same).unwrap();

        assert_eq!(flags(&actual), "TFFTFFTFFT");
        assert_eq!(actual.output_count(), 4);
    }

    #[test]
    fn test_same_never_empty() {
        let actual = build(1, 7, 6, 4, PaddingPolicy::Same).unwrap();

        assert_eq!(flags(&actual), "T");
    }

    #[test]
    fn test_explicit() {
        // Keys 1..=8 fit with one unit of padding each side
        let actual = build(10, 5, 2, 2, PaddingPolicy::Explicit(1, 1)).unwrap();

        assert_eq!(flags(&actual), "FTFTFTFTFF");
        assert_eq!(actual.output_count(), PaddingPolicy::Explicit(1, 1).output_len(10, 5, 2));
    }

    #[test]
    fn test_explicit_asymmetric() {
        let actual = build(6, 3, 0, 1, PaddingPolicy::Explicit(0, 2)).unwrap();

        assert_eq!(flags(&actual), "TTTTTT");
        assert_eq!(actual.output_count(), PaddingPolicy::Explicit(0, 2).output_len(6, 3, 1));
    }

    #[test]
    fn test_kept_positions() {
        let actual = build(10, 3, 1, 4, PaddingPolicy::Valid).unwrap();

        assert_eq!(actual.kept_positions(), vec![1, 5]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(build(10, 3, 1, 0, PaddingPolicy::Valid), Err(ConvError::InvalidStride(0)));
        assert_eq!(build(0, 3, 1, 1, PaddingPolicy::Valid), Err(ConvError::InvalidInputLength(0)));
        assert_eq!(build(10, 3, 3, 1, PaddingPolicy::Valid), Err(ConvError::InvalidKeyIndex { key: 3, filter_len: 3 }));
        assert!(matches!(build(10, 3, 1, 1, PaddingPolicy::Explicit(2, 0)), Err(ConvError::UnusablePadding { .. })));
    }
}
