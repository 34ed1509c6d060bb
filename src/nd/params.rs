use crate::{
    conv::{filter::dilated_len, mask::{self, Mask}, padding::PaddingPolicy},
    error::{ConvError, Result},
    geometry::shape::Shape,
};

/// Parameters of one spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisParams {
    input_len: usize,
    filter_len: usize,
    key: usize,
    stride: usize,
    dilation: usize,
    padding: PaddingPolicy,
}

impl AxisParams {
    pub fn new(
        input_len: usize,
        filter_len: usize,
        key: usize,
        stride: usize,
        dilation: usize,
        padding: PaddingPolicy,
    ) -> Result<Self> {
        if input_len < 1 {
            return Err(ConvError::InvalidInputLength(input_len));
        }
        if filter_len < 1 {
            return Err(ConvError::EmptyFilter);
        }
        if key >= filter_len {
            return Err(ConvError::InvalidKeyIndex { key, filter_len });
        }
        if stride < 1 {
            return Err(ConvError::InvalidStride(stride));
        }
        if dilation < 1 {
            return Err(ConvError::InvalidDilation(dilation));
        }

        let axis = Self { input_len, filter_len, key, stride, dilation, padding };
        padding.check_usable(axis.left_extent(), axis.right_extent())?;

        Ok(axis)
    }

    pub fn input_len(&self) -> usize { self.input_len }
    pub fn filter_len(&self) -> usize { self.filter_len }
    pub fn key(&self) -> usize { self.key }
    pub fn stride(&self) -> usize { self.stride }
    pub fn dilation(&self) -> usize { self.dilation }
    pub fn padding(&self) -> PaddingPolicy { self.padding }

    pub fn effective_len(&self) -> usize { dilated_len(self.filter_len, self.dilation) }
    pub fn left_extent(&self) -> usize { self.key * self.dilation }
    pub fn right_extent(&self) -> usize { self.effective_len() - 1 - self.left_extent() }

    pub fn output_len(&self) -> usize {
        self.padding.output_len(self.input_len, self.effective_len(), self.stride)
    }

    pub fn effective_padding(&self) -> (usize, usize) {
        self.padding.effective_padding(self.input_len, self.effective_len(), self.left_extent(), self.stride)
    }

    /// This axis's 1-D mask.
    pub fn mask(&self) -> Result<Mask> {
        mask::build(self.input_len, self.effective_len(), self.left_extent(), self.stride, self.padding)
    }
}

/// A multi-dimensional convolution: per-axis parameters and a row-major filter.
#[derive(Debug, Clone, PartialEq)]
pub struct NdConvParams {
    axes: Vec<AxisParams>,
    weights: Vec<f64>,
}

impl NdConvParams {
    /// Padding kinds must agree on every axis; only EXPLICIT amounts may vary per axis.
    pub fn new(axes: Vec<AxisParams>, weights: Vec<f64>) -> Result<Self> {
        if axes.is_empty() {
            return Err(ConvError::DimensionMismatch("at least one axis is required".to_string()));
        }

        let kind = axes[0].padding.kind();
        if axes.iter().any(|axis| axis.padding.kind() != kind) {
            let found = axes.iter().map(|axis| axis.padding.to_string()).collect::<Vec<_>>().join(", ");
            return Err(ConvError::PaddingPolicyConflict { found });
        }

        let expected: usize = axes.iter().map(|axis| axis.filter_len).product();
        if weights.len() != expected {
            return Err(ConvError::DimensionMismatch(format!(
                "{} filter weights for a filter of {expected} taps", weights.len())));
        }

        Ok(Self { axes, weights })
    }

    pub fn axes(&self) -> &[AxisParams] { &self.axes }
    pub fn weights(&self) -> &[f64] { &self.weights }
    pub fn rank(&self) -> usize { self.axes.len() }

    pub fn input_shape(&self) -> Shape {
        Shape::new(self.axes.iter().map(|axis| axis.input_len).collect())
    }

    pub fn filter_shape(&self) -> Shape {
        Shape::new(self.axes.iter().map(|axis| axis.filter_len).collect())
    }

    /// Closed-form output extent of every axis.
    pub fn output_shape(&self) -> Vec<usize> {
        self.axes.iter().map(AxisParams::output_len).collect()
    }
}
