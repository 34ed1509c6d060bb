use std::fmt;

/// A single position where an observed output differs from the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discrepancy {
    pub position: usize,
    pub observed: f64,
    pub expected: f64,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] observed {} expected {}", self.position, self.observed, self.expected)
    }
}

/// Every way building or checking a convolution operator can fail.
/// Builders fail before returning anything, so a partial matrix or mask never escapes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvError {
    #[error("dilation must be at least 1, got {0}")]
    InvalidDilation(usize),

    #[error("stride must be at least 1, got {0}")]
    InvalidStride(usize),

    #[error("key index {key} is outside a filter of length {filter_len}")]
    InvalidKeyIndex { key: usize, filter_len: usize },

    #[error("input length must be at least 1, got {0}")]
    InvalidInputLength(usize),

    #[error("filter must have at least one tap")]
    EmptyFilter,

    #[error("mask keeps {kept} positions but {supplied} values were supplied")]
    MaskLengthMismatch { kept: usize, supplied: usize },

    #[error("padding policies must be uniform across dimensions, found {found}")]
    PaddingPolicyConflict { found: String },

    #[error("padding ({pad_left}, {pad_right}) exceeds filter extents ({left_extent}, {right_extent})")]
    UnusablePadding {
        pad_left: usize,
        pad_right: usize,
        left_extent: usize,
        right_extent: usize,
    },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("index {index} out of bounds for axis {axis} of length {len}")]
    IndexOutOfBounds { axis: usize, index: usize, len: usize },

    #[error("output length {observed} differs from reference length {expected}")]
    OutputLengthMismatch { observed: usize, expected: usize },

    #[error("{} position(s) differ from reference, first {}", .discrepancies.len(), first_discrepancy(.discrepancies))]
    NumericMismatch { discrepancies: Vec<Discrepancy> },
}

fn first_discrepancy(discrepancies: &[Discrepancy]) -> String {
    discrepancies.first().map(|d| d.to_string()).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ConvError>;
