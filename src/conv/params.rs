use crate::error::{ConvError, Result};

use super::{filter::FilterSpec, padding::PaddingPolicy};

/// Everything that determines a 1-D operator and its mask. Both must be
/// derived from the same instance to agree on shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvParams {
    input_len: usize,
    filter: FilterSpec,
    stride: usize,
    padding: PaddingPolicy,
}

impl ConvParams {
    pub fn new(input_len: usize, filter: FilterSpec, stride: usize, padding: PaddingPolicy) -> Result<Self> {
        if input_len < 1 {
            return Err(ConvError::InvalidInputLength(input_len));
        }
        if stride < 1 {
            return Err(ConvError::InvalidStride(stride));
        }
        padding.check_usable(filter.left_extent(), filter.right_extent())?;

        Ok(Self { input_len, filter, stride, padding })
    }

    pub fn input_len(&self) -> usize { self.input_len }
    pub fn filter(&self) -> &FilterSpec { &self.filter }
    pub fn stride(&self) -> usize { self.stride }
    pub fn padding(&self) -> PaddingPolicy { self.padding }

    pub fn effective_len(&self) -> usize { self.filter.effective_len() }

    /// Number of kept outputs, from the closed form for the policy.
    pub fn output_len(&self) -> usize {
        self.padding.output_len(self.input_len, self.effective_len(), self.stride)
    }

    /// Explicit (left, right) padding equivalent to this policy for this key.
    pub fn effective_padding(&self) -> (usize, usize) {
        self.padding.effective_padding(self.input_len, self.effective_len(), self.filter.left_extent(), self.stride)
    }

    /// Residue modulo stride of the first kept row.
    pub fn phase(&self) -> usize {
        let (pad_left, _) = self.effective_padding();
        (self.filter.left_extent() - pad_left.min(self.filter.left_extent())) % self.stride
    }
}
