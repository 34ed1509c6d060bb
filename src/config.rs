use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::conv::padding::PaddingPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which direction of the convolution a case checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Transpose,
}

/// Multi-dimensional sweep. Stride, dilation and padding apply to every axis of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NdGridConfig {
    pub input_shapes: Vec<Vec<usize>>,
    pub filter_shapes: Vec<Vec<usize>>,
    pub strides: Vec<usize>,
    pub dilations: Vec<usize>,
    pub paddings: Vec<PaddingPolicy>,
}

impl Default for NdGridConfig {
    fn default() -> Self {
        Self {
            input_shapes: vec![vec![7, 9]],
            filter_shapes: vec![vec![3, 3], vec![1, 4]],
            strides: vec![1, 2],
            dilations: vec![1, 2],
            paddings: vec![PaddingPolicy::Valid, PaddingPolicy::Same],
        }
    }
}

/// Everything the equivalence sweep needs. Missing keys in a config file take these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub input_lengths: Vec<usize>,
    pub filters: Vec<Vec<f64>>,
    /// Key taps to try; empty means every tap of each filter.
    pub key_indices: Vec<usize>,
    pub strides: Vec<usize>,
    pub dilations: Vec<usize>,
    pub paddings: Vec<PaddingPolicy>,
    pub directions: Vec<Direction>,
    /// Random inputs are integers in 1..=max_input_value.
    pub max_input_value: u32,
    pub seed: u64,
    pub tolerance: f64,
    /// How many mismatching cases the report spells out.
    pub max_reported: usize,
    /// Cases slower than this are logged.
    pub case_budget_ms: u64,
    /// Worker threads; None uses available parallelism.
    pub workers: Option<usize>,
    pub nd: Option<NdGridConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            input_lengths: vec![50],
            filters: vec![vec![1., 2., 3.], vec![1., 2., 3., 2., 1.]],
            key_indices: Vec::new(),
            strides: vec![1, 2, 3],
            dilations: vec![1, 2],
            paddings: vec![PaddingPolicy::Valid, PaddingPolicy::Same, PaddingPolicy::Explicit(1, 1)],
            directions: vec![Direction::Forward, Direction::Transpose],
            max_input_value: 10,
            seed: 0,
            tolerance: 1e-9,
            max_reported: 10,
            case_budget_ms: 1000,
            workers: None,
            nd: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Rejects sweeps that could never produce a checkable case: empty lists, and zero
    /// lengths, strides or dilations, which every case built from them would be
    /// rejected for. Other per-case parameter errors are left to the builders so
    /// they show up in the report.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let empty = [
            ("input_lengths", self.input_lengths.is_empty()),
            ("filters", self.filters.is_empty()),
            ("strides", self.strides.is_empty()),
            ("dilations", self.dilations.is_empty()),
            ("paddings", self.paddings.is_empty()),
            ("directions", self.directions.is_empty()),
        ];
        if let Some((name, _)) = empty.iter().find(|(_, is_empty)| *is_empty) {
            return Err(ConfigError::Invalid(format!("{name} must not be empty")));
        }
        let zero = [
            ("input_lengths", &self.input_lengths),
            ("strides", &self.strides),
            ("dilations", &self.dilations),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, values)| values.contains(&0)) {
            return Err(ConfigError::Invalid(format!("{name} must all be at least 1")));
        }
        if self.max_input_value < 1 {
            return Err(ConfigError::Invalid("max_input_value must be at least 1".to_string()));
        }
        if self.tolerance.is_nan() || self.tolerance < 0. {
            return Err(ConfigError::Invalid(format!("tolerance must be non-negative, got {}", self.tolerance)));
        }
        if let Some(nd) = &self.nd {
            if nd.input_shapes.iter().chain(&nd.filter_shapes).any(|shape| shape.is_empty()) {
                return Err(ConfigError::Invalid("nd shapes need at least one axis".to_string()));
            }
            if nd.input_shapes.iter().chain(&nd.filter_shapes).flatten().any(|&len| len == 0) {
                return Err(ConfigError::Invalid("nd shape axes must all be at least 1".to_string()));
            }
            if nd.strides.contains(&0) || nd.dilations.contains(&0) {
                return Err(ConfigError::Invalid("nd strides and dilations must all be at least 1".to_string()));
            }
        }
        Ok(())
    }
}

/// Parses `valid`, `same`, a single amount `p` (p on both sides) or `left,right`.
pub fn parse_padding(text: &str) -> Result<PaddingPolicy, ConfigError> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "valid" => return Ok(PaddingPolicy::Valid),
        "same" => return Ok(PaddingPolicy::Same),
        _ => {}
    }

    let amounts = text.split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Invalid(format!("padding '{text}': {e}")))?;

    match amounts[..] {
        [both] => Ok(PaddingPolicy::Explicit(both, both)),
        [left, right] => Ok(PaddingPolicy::Explicit(left, right)),
        _ => Err(ConfigError::Invalid(format!("padding '{text}' needs one or two amounts"))),
    }
}

/// Parses a comma-separated list of filter taps.
pub fn parse_filter(text: &str) -> Result<Vec<f64>, ConfigError> {
    text.split(',')
        .map(|part| part.trim().parse::<f64>()
            .map_err(|e| ConfigError::Invalid(format!("filter tap '{part}': {e}"))))
        .collect()
}
