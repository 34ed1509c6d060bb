use crate::error::{ConvError, Result};

/// One stored nonzero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub row: usize,
    pub column: usize,
    pub value: f64,
}

/// Linear operator stored in coordinate form.
/// Builders emit entries row by row, so a freshly built matrix is row-major ordered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseMatrix {
    rows: usize,
    columns: usize,
    entries: Vec<Entry>,
}

impl SparseMatrix {
    pub fn new(rows: usize, columns: usize, entries: Vec<Entry>) -> Result<Self> {
        if let Some(entry) = entries.iter().find(|e| e.row >= rows || e.column >= columns) {
            return Err(ConvError::DimensionMismatch(format!(
                "entry ({}, {}) outside {rows}x{columns} matrix", entry.row, entry.column)));
        }

        Ok(Self { rows, columns, entries })
    }

    /// Skips the bounds scan; callers guarantee every entry is in range.
    pub(crate) fn from_checked(rows: usize, columns: usize, entries: Vec<Entry>) -> Self {
        debug_assert!(entries.iter().all(|e| e.row < rows && e.column < columns));
        Self { rows, columns, entries }
    }

    pub fn row_count(&self) -> usize { self.rows }
    pub fn column_count(&self) -> usize { self.columns }
    pub fn shape(&self) -> (usize, usize) { (self.rows, self.columns) }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize { self.entries.len() }

    pub fn entries(&self) -> &[Entry] { &self.entries }

    /// Value at (row, column), zero where nothing is stored.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.entries.iter()
            .filter(|e| e.row == row && e.column == column)
            .map(|e| e.value)
            .sum()
    }

    /// Swaps row and column of every entry. Linear in the number of entries.
    pub fn transpose(&self) -> Self {
        let entries = self.entries.iter()
            .map(|e| Entry { row: e.column, column: e.row, value: e.value })
            .collect();

        Self { rows: self.columns, columns: self.rows, entries }
    }

    /// y = A·x
    pub fn mul_vector(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.columns {
            return Err(ConvError::DimensionMismatch(format!(
                "vector of length {} for matrix with {} columns", x.len(), self.columns)));
        }

        let mut y = vec![0.; self.rows];
        for entry in &self.entries {
            y[entry.row] += entry.value * x[entry.column];
        }

        Ok(y)
    }

    /// y = Aᵗ·x without building the transpose.
    pub fn mul_vector_transposed(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.rows {
            return Err(ConvError::DimensionMismatch(format!(
                "vector of length {} for transposed matrix with {} columns", x.len(), self.rows)));
        }

        let mut y = vec![0.; self.columns];
        for entry in &self.entries {
            y[entry.column] += entry.value * x[entry.row];
        }

        Ok(y)
    }

    /// Dense row-major copy, for diagnostics on small operators.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut values = vec![0.; self.rows * self.columns];
        for entry in &self.entries {
            values[entry.row * self.columns + entry.column] += entry.value;
        }

        values
    }
}
