use crate::error::{ConvError, Result};

use super::{mask::{self, Mask}, matrix_builder, params::ConvParams, sampler, sparse::SparseMatrix};

/// A 1-D convolution expressed as a sparse operator plus an output mask,
/// both derived from one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Convolution {
    params: ConvParams,
    matrix: SparseMatrix,
    mask: Mask,
}

impl Convolution {
    pub fn new(params: ConvParams) -> Result<Self> {
        let matrix = matrix_builder::build_for(&params)?;
        let mask = mask::build_for(&params)?;

        Ok(Self { params, matrix, mask })
    }

    pub fn params(&self) -> &ConvParams { &self.params }
    pub fn matrix(&self) -> &SparseMatrix { &self.matrix }
    pub fn mask(&self) -> &Mask { &self.mask }

    pub fn output_len(&self) -> usize { self.mask.output_count() }

    /// compact(M·x, mask)
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.params.input_len() {
            return Err(ConvError::DimensionMismatch(format!(
                "input of length {} for convolution over {}", input.len(), self.params.input_len())));
        }

        let raw = self.matrix.mul_vector(input)?;
        sampler::compact(&raw, &self.mask)
    }

    /// Mᵗ·expand(y, mask)
    pub fn transpose(&self, grad_output: &[f64]) -> Result<Vec<f64>> {
        let spread = sampler::expand(grad_output, &self.mask)?;
        self.matrix.mul_vector_transposed(&spread)
    }
}

/// Forward convolution of input under params.
pub fn convolve(params: &ConvParams, input: &[f64]) -> Result<Vec<f64>> {
    Convolution::new(params.clone())?.forward(input)
}

/// Transpose convolution of a gradient under params, yielding a vector of the input length.
pub fn convolve_transpose(params: &ConvParams, grad_output: &[f64]) -> Result<Vec<f64>> {
    Convolution::new(params.clone())?.transpose(grad_output)
}
