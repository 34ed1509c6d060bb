use log::trace;

use crate::{error::{ConvError, Result}, partition::Partition, partitioner::{available_workers, Partitioner}};

use super::{filter::validate_filter, params::ConvParams, sparse::{Entry, SparseMatrix}};

/// Builds the N×N operator whose row r is the filter slid so its key tap sits on column r.
/// Taps that fall off either end of the input are simply not stored, which is
/// exactly zero padding. Zero-valued taps are never stored.
pub fn build(input_len: usize, filter: &[f64], key: usize, dilation: usize) -> Result<SparseMatrix> {
    if input_len < 1 {
        return Err(ConvError::InvalidInputLength(input_len));
    }
    if dilation < 1 {
        return Err(ConvError::InvalidDilation(dilation));
    }
    validate_filter(filter, key)?;

    let key_offset = (key * dilation) as isize;
    let row_entries = |partition: &Partition| {
        let mut partition_values = Vec::with_capacity(partition.size() * filter.len());
        for row in partition.range() {
            for (tap, &weight) in filter.iter().enumerate() {
                if weight == 0. {
                    continue;
                }

                let column = row as isize - key_offset + (tap * dilation) as isize;
                if column >= 0 && (column as usize) < input_len {
                    partition_values.push(Entry { row, column: column as usize, value: weight });
                }
            }
        }
        partition_values
    };

    let entries = Partitioner::for_workload(input_len, available_workers()).parallelized(row_entries);
    trace!("built {input_len}x{input_len} operator with {} entries", entries.len());

    Ok(SparseMatrix::from_checked(input_len, input_len, entries))
}

/// Operator for a validated parameter set.
pub fn build_for(params: &ConvParams) -> Result<SparseMatrix> {
    let filter = params.filter();
    build(params.input_len(), filter.weights(), filter.key(), filter.dilation())
}
