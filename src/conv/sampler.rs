use crate::error::{ConvError, Result};

use super::mask::Mask;

/// Keeps the values at kept mask positions, in index order.
pub fn compact<T: Copy>(values: &[T], mask: &Mask) -> Result<Vec<T>> {
    if values.len() != mask.len() {
        return Err(ConvError::DimensionMismatch(format!(
            "{} values for a mask of length {}", values.len(), mask.len())));
    }

    Ok(values.iter()
        .zip(mask.slots())
        .filter_map(|(&value, &kept)| kept.then_some(value))
        .collect())
}

/// Spreads compacted values back over the mask, filling dropped positions with zero.
/// Every compacted value must be consumed, exactly one per kept position.
pub fn expand<T: Copy + Default>(compacted: &[T], mask: &Mask) -> Result<Vec<T>> {
    let kept = mask.output_count();
    if kept != compacted.len() {
        return Err(ConvError::MaskLengthMismatch { kept, supplied: compacted.len() });
    }

    let mut cursor = 0;
    let mut values = Vec::with_capacity(mask.len());
    for &is_kept in mask.slots() {
        if is_kept {
            values.push(compacted[cursor]);
            cursor += 1;
        } else {
            values.push(T::default());
        }
    }
    debug_assert_eq!(cursor, compacted.len());

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask() -> Mask {
        Mask::from(vec![false, true, true, false, true])
    }

    #[test]
    fn test_compact() {
        let actual = compact(&[1., 2., 3., 4., 5.], &mask()).unwrap();

        assert_eq!(actual, vec![2., 3., 5.]);
    }

    #[test]
    fn test_expand() {
        let actual = expand(&[7., 8., 9.], &mask()).unwrap();

        assert_eq!(actual, vec![0., 7., 8., 0., 9.]);
    }

    #[test]
    fn test_round_trip_zeroes_dropped_positions() {
        let tc = [5, -3, 8, 1, 2];

        let actual = expand(&compact(&tc, &mask()).unwrap(), &mask()).unwrap();

        assert_eq!(actual, vec![0, -3, 8, 0, 2]);
    }

    #[test]
    fn test_expand_count_mismatch() {
        assert_eq!(expand(&[1., 2.], &mask()), Err(ConvError::MaskLengthMismatch { kept: 3, supplied: 2 }));
        assert_eq!(expand(&[1., 2., 3., 4.], &mask()), Err(ConvError::MaskLengthMismatch { kept: 3, supplied: 4 }));
    }

    #[test]
    fn test_compact_length_mismatch() {
        assert!(matches!(compact(&[1., 2.], &mask()), Err(ConvError::DimensionMismatch(_))));
    }

    #[test]
    fn test_empty_mask() {
        let tc = Mask::from(vec![false; 3]);

        assert_eq!(compact(&[1., 2., 3.], &tc).unwrap(), Vec::<f64>::new());
        assert_eq!(expand::<f64>(&[], &tc).unwrap(), vec![0., 0., 0.]);
    }
}
