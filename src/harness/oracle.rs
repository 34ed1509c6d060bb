use crate::{
    conv::filter::dilated_len,
    error::{ConvError, Result},
    geometry::shape::Shape,
};

/// Window parameters of one axis, in the explicit form frameworks accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleAxis {
    pub stride: usize,
    pub pad_left: usize,
    pub pad_right: usize,
    pub dilation: usize,
    /// Extra trailing length of a transpose output; ignored by forward convolution.
    pub output_padding: usize,
}

/// An independent convolution implementation the matrix formulation is checked against.
/// Inputs, filters and outputs are row-major buffers described by their shapes.
pub trait ReferenceOracle: Sync {
    fn name(&self) -> &str;

    fn conv(
        &self,
        input: &[f64],
        input_shape: &Shape,
        filter: &[f64],
        filter_shape: &Shape,
        axes: &[OracleAxis],
    ) -> Result<Vec<f64>>;

    fn conv_transpose(
        &self,
        grad_output: &[f64],
        grad_shape: &Shape,
        filter: &[f64],
        filter_shape: &Shape,
        axes: &[OracleAxis],
    ) -> Result<Vec<f64>>;
}

/// Textbook sliding-window convolution over an implicitly zero-padded input,
/// cross-correlation ordering as deep-learning frameworks compute it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectOracle;

fn check_buffers(values: &[f64], shape: &Shape, filter: &[f64], filter_shape: &Shape, axes: &[OracleAxis]) -> Result<()> {
    if values.len() != shape.size() || filter.len() != filter_shape.size() {
        return Err(ConvError::DimensionMismatch("buffer length differs from its shape".to_string()));
    }
    if shape.rank() != filter_shape.rank() || shape.rank() != axes.len() {
        return Err(ConvError::DimensionMismatch(format!(
            "ranks {}, {} and {} axes", shape.rank(), filter_shape.rank(), axes.len())));
    }
    if let Some(axis) = axes.iter().find(|axis| axis.stride < 1 || axis.dilation < 1) {
        return Err(if axis.stride < 1 { ConvError::InvalidStride(axis.stride) } else { ConvError::InvalidDilation(axis.dilation) });
    }
    Ok(())
}

/// Padded-input coordinate of a tap, shifted back into unpadded coordinates.
fn source_index(window: &[usize], tap: &[usize], axes: &[OracleAxis], bounds: &Shape) -> Option<Vec<usize>> {
    let mut index = Vec::with_capacity(axes.len());
    for (axis, params) in axes.iter().enumerate() {
        let position = (window[axis] * params.stride + tap[axis] * params.dilation) as isize - params.pad_left as isize;
        if position < 0 || position as usize >= bounds.axis_len(axis) {
            return None;
        }
        index.push(position as usize);
    }

    Some(index)
}

impl ReferenceOracle for DirectOracle {
    fn name(&self) -> &str { "direct" }

    fn conv(
        &self,
        input: &[f64],
        input_shape: &Shape,
        filter: &[f64],
        filter_shape: &Shape,
        axes: &[OracleAxis],
    ) -> Result<Vec<f64>> {
        check_buffers(input, input_shape, filter, filter_shape, axes)?;

        let output_dims = axes.iter().enumerate().map(|(axis, params)| {
            let padded = input_shape.axis_len(axis) + params.pad_left + params.pad_right;
            let span = dilated_len(filter_shape.axis_len(axis), params.dilation);
            if padded < span { 0 } else { (padded - span) / params.stride + 1 }
        }).collect();
        let output_shape = Shape::new(output_dims);

        let mut output = Vec::with_capacity(output_shape.size());
        for window in output_shape.indices() {
            let mut accumulator = 0.;
            for (tap, &weight) in filter_shape.indices().zip(filter) {
                if let Some(source) = source_index(&window, &tap, axes, input_shape) {
                    accumulator += weight * input[input_shape.flatten(&source)?];
                }
            }
            output.push(accumulator);
        }

        Ok(output)
    }

    fn conv_transpose(
        &self,
        grad_output: &[f64],
        grad_shape: &Shape,
        filter: &[f64],
        filter_shape: &Shape,
        axes: &[OracleAxis],
    ) -> Result<Vec<f64>> {
        check_buffers(grad_output, grad_shape, filter, filter_shape, axes)?;

        let mut output_dims = Vec::with_capacity(axes.len());
        for (axis, params) in axes.iter().enumerate() {
            let span = dilated_len(filter_shape.axis_len(axis), params.dilation) as isize;
            let len = (grad_shape.axis_len(axis) as isize - 1) * params.stride as isize + span
                - params.pad_left as isize - params.pad_right as isize + params.output_padding as isize;
            if len < 0 {
                return Err(ConvError::DimensionMismatch(format!("transpose output length {len} on axis {axis}")));
            }
            output_dims.push(len as usize);
        }
        let output_shape = Shape::new(output_dims);

        let mut output = vec![0.; output_shape.size()];
        for (window, &grad) in grad_shape.indices().zip(grad_output) {
            for (tap, &weight) in filter_shape.indices().zip(filter) {
                if let Some(target) = source_index(&window, &tap, axes, &output_shape) {
                    output[output_shape.flatten(&target)?] += weight * grad;
                }
            }
        }

        Ok(output)
    }
}
