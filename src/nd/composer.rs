use log::trace;

use crate::{
    conv::{mask::Mask, sampler, sparse::{Entry, SparseMatrix}},
    error::{ConvError, Result},
    geometry::shape::Shape,
    partition::Partition,
    partitioner::{available_workers, Partitioner},
};

use super::params::NdConvParams;

/// A multi-dimensional convolution flattened row-major into one sparse operator
/// over the flattened input, with the Cartesian product of the per-axis masks.
#[derive(Debug, Clone, PartialEq)]
pub struct NdComposer {
    params: NdConvParams,
    input_shape: Shape,
    matrix: SparseMatrix,
    mask: Mask,
}

/// AND of the per-axis masks at every multi-index, flattened row-major.
pub fn compose_mask(params: &NdConvParams) -> Result<Mask> {
    let mut slots = vec![true];
    for axis in params.axes() {
        let axis_mask = axis.mask()?;
        slots = slots.iter()
            .flat_map(|&outer| axis_mask.slots().iter().map(move |&inner| outer && inner))
            .collect();
    }

    Ok(Mask::from(slots))
}

/// Per-axis displacement of every nonzero filter tap relative to the key.
fn tap_offsets(params: &NdConvParams) -> Result<Vec<(Vec<isize>, f64)>> {
    let filter_shape = params.filter_shape();
    let mut taps = Vec::with_capacity(params.weights().len());
    for (flat, &weight) in params.weights().iter().enumerate() {
        if weight == 0. {
            continue;
        }

        let tap = filter_shape.unflatten(flat)?;
        let offsets = params.axes().iter().zip(&tap)
            .map(|(axis, &t)| (t as isize - axis.key() as isize) * axis.dilation() as isize)
            .collect();
        taps.push((offsets, weight));
    }

    Ok(taps)
}

/// Sparse operator over the flattened input. Each row is taken back to its multi-index,
/// each tap is shifted and bounds checked per axis, and only then re-flattened, so no
/// tap wraps from the end of one row into the start of the next.
pub fn compose_matrix(params: &NdConvParams) -> Result<SparseMatrix> {
    let input_shape = params.input_shape();
    let taps = tap_offsets(params)?;
    let size = input_shape.size();

    let rows = |partition: &Partition| -> Result<Vec<Entry>> {
        let mut partition_values = Vec::with_capacity(partition.size() * taps.len());
        for row in partition.range() {
            let index = input_shape.unflatten(row)?;
            for (offsets, weight) in &taps {
                if let Some(shifted) = input_shape.offset(&index, offsets) {
                    let column = input_shape.flatten(&shifted)?;
                    partition_values.push(Entry { row, column, value: *weight });
                }
            }
        }
        Ok(partition_values)
    };

    let chunks = Partitioner::for_workload(size, available_workers())
        .parallelized(|partition| vec![rows(partition)]);

    let mut entries = Vec::new();
    for chunk in chunks {
        entries.extend(chunk?);
    }
    trace!("built {size}x{size} operator over {:?} with {} entries", input_shape.dimensions(), entries.len());

    Ok(SparseMatrix::from_checked(size, size, entries))
}

impl NdComposer {
    pub fn new(params: NdConvParams) -> Result<Self> {
        let matrix = compose_matrix(&params)?;
        let mask = compose_mask(&params)?;
        let input_shape = params.input_shape();

        Ok(Self { params, input_shape, matrix, mask })
    }

    pub fn params(&self) -> &NdConvParams { &self.params }
    pub fn input_shape(&self) -> &Shape { &self.input_shape }
    pub fn matrix(&self) -> &SparseMatrix { &self.matrix }
    pub fn mask(&self) -> &Mask { &self.mask }

    /// Row-major output shape; its size is the mask's kept count.
    pub fn output_shape(&self) -> Vec<usize> { self.params.output_shape() }

    /// Forward convolution of a row-major input, returning row-major output.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_shape.size() {
            return Err(ConvError::DimensionMismatch(format!(
                "input of {} values for shape {:?}", input.len(), self.input_shape.dimensions())));
        }

        let raw = self.matrix.mul_vector(input)?;
        sampler::compact(&raw, &self.mask)
    }

    /// Transpose convolution of a row-major gradient, returning a row-major input-shaped result.
    pub fn transpose(&self, grad_output: &[f64]) -> Result<Vec<f64>> {
        let spread = sampler::expand(grad_output, &self.mask)?;
        self.matrix.mul_vector_transposed(&spread)
    }
}

#[cfg(test)]
mod tests {
    use crate::{conv::{matrix_builder, padding::PaddingPolicy}, nd::params::AxisParams};

    use super::*;

    fn params_2d(padding: PaddingPolicy, filter: (usize, usize), key: (usize, usize), weights: Vec<f64>) -> NdConvParams {
        NdConvParams::new(vec![
            AxisParams::new(3, filter.0, key.0, 1, 1, padding).unwrap(),
            AxisParams::new(4, filter.1, key.1, 1, 1, padding).unwrap(),
        ], weights).unwrap()
    }

    #[test]
    fn test_horizontal_tap_never_wraps_into_next_row() {
        // 1x2 filter keyed on its left tap over a 3x4 input.
        let tc = params_2d(PaddingPolicy::Same, (1, 2), (0, 0), vec![1., 10.]);

        let actual = compose_matrix(&tc).unwrap();

        // Last column of row 0 is flat 3; flat 4 is row 1 column 0 and must not appear.
        assert_eq!(actual.get(3, 4), 0.);
        assert_eq!(actual.get(3, 3), 1.);
        assert_eq!(actual.get(2, 3), 10.);
        assert_eq!(actual.get(7, 8), 0.);
        // 12 taps, minus one dropped per row at the right edge
        assert_eq!(actual.nnz(), 12 + 12 - 3);
    }

    #[test]
    fn test_vertical_taps_respect_top_and_bottom() {
        let tc = params_2d(PaddingPolicy::Same, (3, 1), (1, 0), vec![1., 2., 3.]);

        let actual = compose_matrix(&tc).unwrap();

        // Row 0 has no row above: only center and below.
        assert_eq!(actual.get(0, 0), 2.);
        assert_eq!(actual.get(0, 4), 3.);
        // Middle row sees both neighbours exactly one stride of 4 away.
        assert_eq!(actual.get(5, 1), 1.);
        assert_eq!(actual.get(5, 9), 3.);
        assert_eq!(actual.nnz(), 4 * 2 + 4 * 3 + 4 * 2);
    }

    #[test]
    fn test_single_axis_matches_1d_builder() {
        let tc = NdConvParams::new(
            vec![AxisParams::new(9, 3, 2, 2, 2, PaddingPolicy::Valid).unwrap()],
            vec![1., -1., 4.]).unwrap();

        let expected = matrix_builder::build(9, &[1., -1., 4.], 2, 2).unwrap();
        let actual = compose_matrix(&tc).unwrap();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_mask_is_cartesian_product() {
        let tc = NdConvParams::new(vec![
            AxisParams::new(4, 3, 1, 1, 1, PaddingPolicy::Valid).unwrap(),
            AxisParams::new(5, 2, 0, 2, 1, PaddingPolicy::Valid).unwrap(),
        ], vec![1.; 6]).unwrap();

        let actual = compose_mask(&tc).unwrap();

        // axis 0 keeps 1,2; axis 1 keeps 0,2
        let mut expected = vec![false; 20];
        for (r, c) in [(1, 0), (1, 2), (2, 0), (2, 2)] {
            expected[r * 5 + c] = true;
        }
        assert_eq!(actual.slots(), &expected[..]);
        assert_eq!(actual.output_count(), tc.output_shape().iter().product::<usize>());
    }

    #[test]
    fn test_forward_2d_valid() {
        let tc = params_2d(PaddingPolicy::Valid, (2, 2), (0, 0), vec![1., 2., 3., 4.]);
        let composer = NdComposer::new(tc).unwrap();
        let input: Vec<f64> = (0..12).map(|x| x as f64).collect();

        let actual = composer.forward(&input).unwrap();

        // out[i][j] = x[i][j] + 2x[i][j+1] + 3x[i+1][j] + 4x[i+1][j+1]
        let expected: Vec<f64> = (0..2).flat_map(|i| (0..3).map(move |j| {
            let x = |r: usize, c: usize| (r * 4 + c) as f64;
            x(i, j) + 2. * x(i, j + 1) + 3. * x(i + 1, j) + 4. * x(i + 1, j + 1)
        })).collect();

        assert_eq!(composer.output_shape(), vec![2, 3]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_transpose_length_checked() {
        let composer = NdComposer::new(params_2d(PaddingPolicy::Valid, (2, 2), (0, 0), vec![1.; 4])).unwrap();

        assert_eq!(composer.transpose(&[1.; 5]), Err(ConvError::MaskLengthMismatch { kept: 6, supplied: 5 }));
        assert_eq!(composer.transpose(&[1.; 6]).unwrap().len(), 12);
    }
}
