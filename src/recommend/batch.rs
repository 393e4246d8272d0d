//! Rectangular batches of unified ids.

use crate::error::{GarError, Result};

/// Row-major `(rows, cols)` matrix of unified ids.
///
/// Training batches have `num_neg + 1` columns. Only column 0 (the user, or
/// the positive item) is read by the loss.
///
/// ```
/// use garrec::recommend::IdBatch;
///
/// let items = IdBatch::from_rows(&[vec![5, 7], vec![6, 4]]).unwrap();
/// assert_eq!(items.shape(), (2, 2));
/// assert_eq!(items.column(0), vec![5, 6]);
///
/// let users = IdBatch::repeat_rows(&[0, 1], 2).unwrap();
/// assert_eq!(users.row(1), &[1, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdBatch {
    ids: Vec<usize>,
    rows: usize,
    cols: usize,
}

impl IdBatch {
    /// Wrap `ids` as a `(rows, cols)` batch.
    pub fn new(ids: Vec<usize>, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GarError::empty_input("id batch"));
        }
        if ids.len() != rows * cols {
            return Err(GarError::dimension_mismatch("rows*cols", rows * cols, ids.len()));
        }
        Ok(Self { ids, rows, cols })
    }

    /// Build a batch from row vectors, rejecting ragged input.
    pub fn from_rows(rows: &[Vec<usize>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut ids = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(GarError::dimension_mismatch("batch columns", cols, row.len()));
            }
            ids.extend_from_slice(row);
        }
        Self::new(ids, rows.len(), cols)
    }

    /// Single-column batch.
    pub fn from_column(ids: &[usize]) -> Result<Self> {
        Self::new(ids.to_vec(), ids.len(), 1)
    }

    /// Each id repeated across `cols` columns, the layout of a user batch.
    pub fn repeat_rows(ids: &[usize], cols: usize) -> Result<Self> {
        let data = ids
            .iter()
            .flat_map(|&id| std::iter::repeat(id).take(cols))
            .collect();
        Self::new(data, ids.len(), cols)
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Id at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(self.ids[row * self.cols + col])
        } else {
            None
        }
    }

    /// One row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[usize] {
        &self.ids[row * self.cols..(row + 1) * self.cols]
    }

    /// One column, copied out.
    ///
    /// # Panics
    ///
    /// Panics if `col >= cols`.
    #[must_use]
    pub fn column(&self, col: usize) -> Vec<usize> {
        assert!(col < self.cols, "column {col} out of range for {} columns", self.cols);
        self.ids.iter().skip(col).step_by(self.cols).copied().collect()
    }

    /// All ids in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let batch = IdBatch::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(batch.shape(), (2, 3));
        assert_eq!(batch.column(0), vec![1, 4]);
        assert_eq!(batch.column(2), vec![3, 6]);
        assert_eq!(batch.get(1, 1), Some(5));
        assert_eq!(batch.get(2, 0), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = IdBatch::from_rows(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, GarError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            IdBatch::from_rows(&[]),
            Err(GarError::EmptyInput { .. })
        ));
        assert!(matches!(
            IdBatch::from_rows(&[vec![]]),
            Err(GarError::EmptyInput { .. })
        ));
        assert!(IdBatch::from_column(&[]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(IdBatch::new(vec![1, 2, 3], 2, 2).is_err());
    }

    #[test]
    fn test_repeat_rows() {
        let batch = IdBatch::repeat_rows(&[7, 9], 3).unwrap();
        assert_eq!(batch.as_slice(), &[7, 7, 7, 9, 9, 9]);
        assert_eq!(batch.column(1), vec![7, 9]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_column_out_of_range_panics() {
        let _ = IdBatch::from_column(&[1]).unwrap().column(1);
    }
}
