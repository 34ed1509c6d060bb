use std::fmt;

use crate::{config::{Direction, HarnessConfig, NdGridConfig}, conv::padding::PaddingPolicy};

/// A 1-D case: one filter with one key tap.
#[derive(Debug, Clone, PartialEq)]
pub struct LineCase {
    pub input_len: usize,
    pub filter: Vec<f64>,
    pub key: usize,
    pub stride: usize,
    pub dilation: usize,
    pub padding: PaddingPolicy,
}

/// A multi-dimensional case; filters are keyed on their middle tap per axis and
/// filled with random weights.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCase {
    pub input_shape: Vec<usize>,
    pub filter_shape: Vec<usize>,
    pub stride: usize,
    pub dilation: usize,
    pub padding: PaddingPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseSpec {
    Line(LineCase),
    Grid(GridCase),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    /// Position in the sweep, also mixed into the random seed.
    pub index: usize,
    pub direction: Direction,
    pub spec: CaseSpec,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "fwd"),
            Direction::Transpose => write!(f, "inv"),
        }
    }
}

fn join<T: ToString>(values: &[T], separator: &str) -> String {
    values.iter().map(T::to_string).collect::<Vec<_>>().join(separator)
}

impl fmt::Display for Case {
    /// Tab separated: DIR FILT ILEN STRIDE DIL PAD KEY
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            CaseSpec::Line(line) => write!(f, "{}\t[{}]\t{}\t{}\t{}\t{}\t{}",
                self.direction, join(&line.filter, ","), line.input_len,
                line.stride, line.dilation, line.padding, line.key),
            CaseSpec::Grid(grid) => write!(f, "{}\t{}\t{}\t{}\t{}\t{}\tcenter",
                self.direction, join(&grid.filter_shape, "x"), join(&grid.input_shape, "x"),
                grid.stride, grid.dilation, grid.padding),
        }
    }
}

fn line_specs(config: &HarnessConfig) -> Vec<CaseSpec> {
    let mut specs = Vec::new();
    for &input_len in &config.input_lengths {
        for filter in &config.filters {
            let keys: Vec<usize> = if config.key_indices.is_empty() {
                (0..filter.len().max(1)).collect()
            } else {
                config.key_indices.clone()
            };
            for &key in &keys {
                for &stride in &config.strides {
                    for &dilation in &config.dilations {
                        for &padding in &config.paddings {
                            specs.push(CaseSpec::Line(LineCase {
                                input_len, filter: filter.clone(), key, stride, dilation, padding
                            }));
                        }
                    }
                }
            }
        }
    }

    specs
}

fn grid_specs(nd: &NdGridConfig) -> Vec<CaseSpec> {
    let mut specs = Vec::new();
    for input_shape in &nd.input_shapes {
        for filter_shape in &nd.filter_shapes {
            for &stride in &nd.strides {
                for &dilation in &nd.dilations {
                    for &padding in &nd.paddings {
                        specs.push(CaseSpec::Grid(GridCase {
                            input_shape: input_shape.clone(),
                            filter_shape: filter_shape.clone(),
                            stride, dilation, padding
                        }));
                    }
                }
            }
        }
    }

    specs
}

/// Cartesian product of every configured option, each parameter set once per direction.
pub fn expand(config: &HarnessConfig) -> Vec<Case> {
    let mut specs = line_specs(config);
    if let Some(nd) = &config.nd {
        specs.extend(grid_specs(nd));
    }

    let mut cases = Vec::with_capacity(specs.len() * config.directions.len());
    for &direction in &config.directions {
        for spec in &specs {
            cases.push(Case { index: cases.len(), direction, spec: spec.clone() });
        }
    }

    cases
}
