use crate::error::{ConvError, Result};

/// Row-major shape of a multi-dimensional index space, last axis varying fastest.
/// Strides and size are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    dimensions: Vec<usize>,
    strides: Vec<usize>,
    size: usize,
}

impl Shape {
    pub fn d1(len: usize) -> Self { Self::new(vec![len]) }

    /// Rows by columns.
    pub fn d2(rows: usize, columns: usize) -> Self { Self::new(vec![rows, columns]) }

    pub fn new(dimensions: Vec<usize>) -> Self {
        let mut strides: Vec<usize> = dimensions.iter().rev()
            .scan(1, |running, &len| {
                let stride = *running;
                *running *= len;
                Some(stride)
            })
            .collect();
        strides.reverse();
        let size = dimensions.iter().product();

        Self { dimensions, strides, size }
    }

    /// Number of flat positions.
    pub fn size(&self) -> usize { self.size }

    pub fn rank(&self) -> usize { self.dimensions.len() }

    pub fn dimensions(&self) -> &[usize] { &self.dimensions }

    /// Panics on an axis the shape does not have.
    pub fn axis_len(&self, axis: usize) -> usize { self.dimensions[axis] }

    /// Flat distance between neighbours along an axis.
    pub fn stride_for(&self, axis: usize) -> usize { self.strides[axis] }

    /// Multi-index to flat index. Every coordinate is checked against its own axis,
    /// so a coordinate can never spill into a neighbouring row.
    pub fn flatten(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() {
            return Err(ConvError::DimensionMismatch(
                format!("index of rank {} for shape of rank {}", index.len(), self.rank())));
        }

        let mut flat = 0;
        for (axis, &coordinate) in index.iter().enumerate() {
            if coordinate >= self.dimensions[axis] {
                return Err(ConvError::IndexOutOfBounds { axis, index: coordinate, len: self.dimensions[axis] });
            }
            flat += self.strides[axis] * coordinate;
        }

        Ok(flat)
    }

    /// Flat index back to its unique multi-index.
    pub fn unflatten(&self, flat: usize) -> Result<Vec<usize>> {
        if flat >= self.size {
            return Err(ConvError::IndexOutOfBounds { axis: 0, index: flat, len: self.size });
        }

        let mut remainder = flat;
        let mut index = Vec::with_capacity(self.rank());
        for &stride in &self.strides {
            index.push(remainder / stride);
            remainder %= stride;
        }

        Ok(index)
    }

    /// Shifts each coordinate of index by its own signed offset, returning None
    /// as soon as one axis leaves its bounds.
    pub fn offset(&self, index: &[usize], offsets: &[isize]) -> Option<Vec<usize>> {
        debug_assert_eq!(index.len(), offsets.len());
        let mut shifted = Vec::with_capacity(index.len());
        for axis in 0..index.len() {
            let coordinate = index[axis] as isize + offsets[axis];
            if coordinate < 0 || coordinate >= self.dimensions[axis] as isize {
                return None;
            }
            shifted.push(coordinate as usize);
        }

        Some(shifted)
    }

    /// Iterates all multi-indices in flat order.
    pub fn indices(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..self.size).map(move |flat| {
            let mut remainder = flat;
            self.strides.iter().map(|&stride| {
                let coordinate = remainder / stride;
                remainder %= stride;
                coordinate
            }).collect()
        })
    }
}
