pub mod error;
pub mod partition;
pub mod partitioner;
pub mod timed;
pub mod prettify;
pub mod geometry;
pub mod conv;
pub mod nd;
pub mod harness;
pub mod config;

pub use conv::{
    convolution::{convolve, convolve_transpose, Convolution},
    filter::{dilate, FilterSpec},
    mask::Mask,
    padding::PaddingPolicy,
    params::ConvParams,
    sparse::{Entry, SparseMatrix},
};
pub use error::{ConvError, Result};
pub use geometry::shape::Shape;
pub use nd::{composer::NdComposer, params::{AxisParams, NdConvParams}};
