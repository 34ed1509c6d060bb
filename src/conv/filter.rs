use crate::error::{ConvError, Result};

/// Filter taps, the key tap aligned with each output, and the dilation applied when sliding.
/// The key always indexes the undilated taps; its dilated offset is `key * dilation`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    weights: Vec<f64>,
    key: usize,
    dilation: usize,
}

impl FilterSpec {
    pub fn new(weights: Vec<f64>, key: usize, dilation: usize) -> Result<Self> {
        validate_filter(&weights, key)?;
        if dilation < 1 {
            return Err(ConvError::InvalidDilation(dilation));
        }

        Ok(Self { weights, key, dilation })
    }

    /// Filter keyed on its middle tap.
    pub fn centered(weights: Vec<f64>, dilation: usize) -> Result<Self> {
        let key = centered_key(weights.len());
        Self::new(weights, key, dilation)
    }

    pub fn weights(&self) -> &[f64] { &self.weights }
    pub fn key(&self) -> usize { self.key }
    pub fn dilation(&self) -> usize { self.dilation }
    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }

    /// Lₑ = (L - 1)·d + 1
    pub fn effective_len(&self) -> usize { dilated_len(self.weights.len(), self.dilation) }

    /// Distance from the first dilated tap to the key.
    pub fn left_extent(&self) -> usize { self.key * self.dilation }

    /// Distance from the key to the last dilated tap.
    pub fn right_extent(&self) -> usize { self.effective_len() - 1 - self.left_extent() }

    /// Materializes the dilation, yielding an equivalent filter with dilation 1.
    pub fn dilated(&self) -> Self {
        let (weights, key) = dilate_taps(&self.weights, self.key, self.dilation);
        Self { weights, key, dilation: 1 }
    }
}

/// Middle tap of a filter of filter_len taps, left of middle for even lengths.
pub fn centered_key(filter_len: usize) -> usize {
    filter_len.saturating_sub(1) / 2
}

pub(crate) fn validate_filter(weights: &[f64], key: usize) -> Result<()> {
    if weights.is_empty() {
        return Err(ConvError::EmptyFilter);
    }
    if key >= weights.len() {
        return Err(ConvError::InvalidKeyIndex { key, filter_len: weights.len() });
    }
    Ok(())
}

pub(crate) fn dilated_len(len: usize, dilation: usize) -> usize {
    (len - 1) * dilation + 1
}

fn dilate_taps(filter: &[f64], key: usize, dilation: usize) -> (Vec<f64>, usize) {
    let mut dilated = vec![0.; dilated_len(filter.len(), dilation)];
    for (tap, &weight) in filter.iter().enumerate() {
        dilated[tap * dilation] = weight;
    }

    (dilated, key * dilation)
}

/// Inserts `dilation - 1` zero taps between neighbouring taps.
/// Returns the dilated taps and the dilated key offset.
pub fn dilate(filter: &[f64], key: usize, dilation: usize) -> Result<(Vec<f64>, usize)> {
    if dilation < 1 {
        return Err(ConvError::InvalidDilation(dilation));
    }
    validate_filter(filter, key)?;

    Ok(dilate_taps(filter, key, dilation))
}
