pub mod filter;
pub mod padding;
pub mod params;
pub mod sparse;
pub mod matrix_builder;
pub mod mask;
pub mod sampler;
pub mod convolution;
