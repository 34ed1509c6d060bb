use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConvError, Result};

/// How much implicit zero padding surrounds the input, and therefore which
/// raw output rows count as real outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingPolicy {
    /// No padding, only windows fully inside the input.
    Valid,
    /// Enough padding that every stride-aligned key position from 0 is an output.
    Same,
    /// Caller supplied (left, right) padding.
    Explicit(usize, usize),
}

/// Policy without its amounts, used to check N-D uniformity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Valid,
    Same,
    Explicit,
}

impl fmt::Display for PaddingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaddingPolicy::Valid => write!(f, "VALID"),
            PaddingPolicy::Same => write!(f, "SAME"),
            PaddingPolicy::Explicit(left, right) => write!(f, "EXPLICIT({left},{right})"),
        }
    }
}

impl PaddingPolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            PaddingPolicy::Valid => PolicyKind::Valid,
            PaddingPolicy::Same => PolicyKind::Same,
            PaddingPolicy::Explicit(..) => PolicyKind::Explicit,
        }
    }

    /// Closed-form number of outputs a framework produces for this policy.
    ///
    /// The geometry helpers below take values already accepted by `ConvParams::new` or
    /// `AxisParams::new`, and panic if `input_len`, `effective_len` or `stride` is 0.
    pub fn output_len(&self, input_len: usize, effective_len: usize, stride: usize) -> usize {
        assert_geometry(input_len, effective_len, stride);
        match *self {
            PaddingPolicy::Valid => windows(input_len, effective_len, stride),
            PaddingPolicy::Same => input_len.div_ceil(stride),
            PaddingPolicy::Explicit(left, right) => windows(input_len + left + right, effective_len, stride),
        }
    }

    /// Framework-convention SAME padding: the total needed so the last stride-aligned
    /// window fits, with the odd unit going right.
    pub fn same_split(input_len: usize, effective_len: usize, stride: usize) -> (usize, usize) {
        assert_geometry(input_len, effective_len, stride);
        let covered = (input_len.div_ceil(stride) - 1) * stride + effective_len;
        let total = covered.saturating_sub(input_len);
        let left = total / 2;

        (left, total - left)
    }

    /// Padding the mask actually assumes around the input, given where the key sits.
    /// Feeding these amounts to a framework as explicit padding reproduces the masked outputs.
    pub fn effective_padding(
        &self,
        input_len: usize,
        effective_len: usize,
        left_extent: usize,
        stride: usize,
    ) -> (usize, usize) {
        assert_geometry(input_len, effective_len, stride);
        assert!(left_extent < effective_len, "key offset {left_extent} outside a filter spanning {effective_len}");
        match *self {
            PaddingPolicy::Valid => (0, 0),
            PaddingPolicy::Same => {
                let right_extent = effective_len - 1 - left_extent;
                let last_key = (input_len.div_ceil(stride) - 1) * stride;
                let right = (last_key + right_extent).saturating_sub(input_len - 1);
                (left_extent, right)
            }
            PaddingPolicy::Explicit(left, right) => (left, right),
        }
    }

    /// Explicit padding beyond a key's extent would place outputs on rows the
    /// N×N operator does not have.
    pub fn check_usable(&self, left_extent: usize, right_extent: usize) -> Result<()> {
        if let PaddingPolicy::Explicit(pad_left, pad_right) = *self {
            if pad_left > left_extent || pad_right > right_extent {
                return Err(ConvError::UnusablePadding { pad_left, pad_right, left_extent, right_extent });
            }
        }
        Ok(())
    }
}

fn assert_geometry(input_len: usize, effective_len: usize, stride: usize) {
    assert!(input_len >= 1 && effective_len >= 1 && stride >= 1,
        "unvalidated geometry: input_len {input_len}, effective_len {effective_len}, stride {stride}");
}

fn windows(padded_len: usize, effective_len: usize, stride: usize) -> usize {
    if padded_len < effective_len {
        0
    } else {
        (padded_len - effective_len) / stride + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_len_valid() {
        assert_eq!(PaddingPolicy::Valid.output_len(10, 5, 2), 3);
        assert_eq!(PaddingPolicy::Valid.output_len(10, 5, 1), 6);
        assert_eq!(PaddingPolicy::Valid.output_len(4, 5, 1), 0);
        assert_eq!(PaddingPolicy::Valid.output_len(5, 5, 3), 1);
    }

    #[test]
    fn test_output_len_same() {
        assert_eq!(PaddingPolicy::Same.output_len(10, 3, 1), 10);
        assert_eq!(PaddingPolicy::Same.output_len(10, 3, 3), 4);
        assert_eq!(PaddingPolicy::Same.output_len(1, 9, 4), 1);
    }

    #[test]
    fn test_output_len_explicit() {
        assert_eq!(PaddingPolicy::Explicit(1, 1).output_len(10, 3, 1), 10);
        assert_eq!(PaddingPolicy::Explicit(2, 0).output_len(10, 5, 2), 4);
        assert_eq!(PaddingPolicy::Explicit(0, 1).output_len(3, 5, 1), 0);
    }

    #[test]
    fn test_same_split() {
        // (ceil(10/2) - 1) * 2 + 3 - 10 = 1, odd unit goes right
        assert_eq!(PaddingPolicy::same_split(10, 3, 2), (0, 1));
        assert_eq!(PaddingPolicy::same_split(10, 5, 1), (2, 2));
        assert_eq!(PaddingPolicy::same_split(7, 4, 1), (1, 2));
        // Large stride needs no padding at all
        assert_eq!(PaddingPolicy::same_split(10, 2, 5), (0, 0));
    }

    #[test]
    fn test_same_total_matches_output_len() {
        for input_len in 1..20 {
            for effective_len in 1..8 {
                for stride in 1..5 {
                    let (left, right) = PaddingPolicy::same_split(input_len, effective_len, stride);
                    let explicit = PaddingPolicy::Explicit(left, right).output_len(input_len, effective_len, stride);
                    assert_eq!(explicit, PaddingPolicy::Same.output_len(input_len, effective_len, stride));
                }
            }
        }
    }

    #[test]
    fn test_effective_padding() {
        assert_eq!(PaddingPolicy::Valid.effective_padding(10, 5, 2, 2), (0, 0));
        assert_eq!(PaddingPolicy::Explicit(1, 2).effective_padding(10, 5, 2, 2), (1, 2));
        // Keys at 0,2,..,8 need 2 on the left and 8 + 2 - 9 = 1 on the right
        assert_eq!(PaddingPolicy::Same.effective_padding(10, 5, 2, 2), (2, 1));
        // Keys at 0,3,6 with the key last: nothing needed on the right
        assert_eq!(PaddingPolicy::Same.effective_padding(8, 3, 2, 3), (2, 0));
    }

    #[test]
    fn test_check_usable() {
        assert!(PaddingPolicy::Explicit(2, 2).check_usable(2, 2).is_ok());
        assert!(PaddingPolicy::Same.check_usable(0, 0).is_ok());
        assert_eq!(
            PaddingPolicy::Explicit(3, 0).check_usable(2, 2),
            Err(ConvError::UnusablePadding { pad_left: 3, pad_right: 0, left_extent: 2, right_extent: 2 }));
    }

    #[test]
    #[should_panic(expected = "unvalidated geometry")]
    fn test_output_len_rejects_zero_stride() {
        let _ = PaddingPolicy::Same.output_len(10, 3, 0);
    }

    #[test]
    #[should_panic(expected = "unvalidated geometry")]
    fn test_same_split_rejects_empty_input() {
        let _ = PaddingPolicy::same_split(0, 3, 1);
    }

    #[test]
    #[should_panic(expected = "unvalidated geometry")]
    fn test_effective_padding_rejects_empty_input() {
        let _ = PaddingPolicy::Same.effective_padding(0, 3, 1, 1);
    }

    #[test]
    fn test_serde_forms() {
        let actual: Vec<PaddingPolicy> = serde_json::from_str(r#"["valid", "same", {"explicit": [1, 2]}]"#).unwrap();

        assert_eq!(actual, vec![PaddingPolicy::Valid, PaddingPolicy::Same, PaddingPolicy::Explicit(1, 2)]);
        assert_eq!(PaddingPolicy::Explicit(1, 2).to_string(), "EXPLICIT(1,2)");
    }
}
