//! A sparse matrix with hashed rows and sorted vector columns.
//!
//! Rows are located in O(1) on average; within a row the entries are kept
//! sorted by column key, so a lookup is a binary search falling back to a
//! linear scan on short rows. Row iteration follows insertion order, which
//! keeps floating point reductions over the matrix deterministic.

use indexmap::IndexMap;

use crate::{MeasureError, MeasureResult};

/// Rows at most this long are scanned linearly instead of bisected.
const LINEAR_SCAN_MAX: usize = 11;

/// One entry of a matrix row: the column key and the payload value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowItem<T> {
    pub col: u32,
    pub val: T,
}

#[derive(Debug, Default)]
pub struct SparseMatrix<T> {
    rows: IndexMap<u32, Vec<RowItem<T>>>,
}

impl<T> SparseMatrix<T>
where
    T: Default + Copy,
{
    pub fn new() -> Self {
        Self {
            rows: IndexMap::new(),
        }
    }

    /// Constructs a matrix preallocating the expected number of rows.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows: IndexMap::with_capacity(rows),
        }
    }

    fn locate(row: &[RowItem<T>], col: u32) -> Result<usize, usize> {
        if row.len() <= LINEAR_SCAN_MAX {
            for (i, item) in row.iter().enumerate() {
                if item.col >= col {
                    return if item.col == col { Ok(i) } else { Err(i) };
                }
            }
            Err(row.len())
        } else {
            row.binary_search_by_key(&col, |item| item.col)
        }
    }

    /// Accesses the element, inserting the default value if absent.
    ///
    /// ```
    /// # use clsim::SparseMatrix;
    /// let mut m: SparseMatrix<f64> = SparseMatrix::new();
    /// *m.get_or_insert(0, 2) += 1.5;
    /// *m.get_or_insert(0, 2) += 0.5;
    /// assert_eq!(m.get(0, 2), Some(2.0));
    /// assert_eq!(m.get(0, 3), None);
    /// ```
    pub fn get_or_insert(&mut self, i: u32, j: u32) -> &mut T {
        let row = self.rows.entry(i).or_default();
        match Self::locate(row, j) {
            Ok(pos) => &mut row[pos].val,
            Err(pos) => {
                row.insert(
                    pos,
                    RowItem {
                        col: j,
                        val: T::default(),
                    },
                );
                &mut row[pos].val
            }
        }
    }

    /// Returns the value of the element, or `None` when it is not stored.
    pub fn get(&self, i: u32, j: u32) -> Option<T> {
        let row = self.rows.get(&i)?;
        Self::locate(row, j).ok().map(|pos| row[pos].val)
    }

    /// Returns the value of the element, failing when it is not stored.
    pub fn at(&self, i: u32, j: u32) -> MeasureResult<T> {
        self.get(i, j)
            .ok_or_else(|| MeasureError::NotFound(format!("matrix element ({}, {})", i, j)))
    }

    /// The number of stored rows.
    pub fn row_num(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entries of the row in ascending column order, empty when the row is
    /// not stored.
    pub fn row(&self, i: u32) -> &[RowItem<T>] {
        self.rows.get(&i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates rows in insertion order; row entries are sorted by column.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &[RowItem<T>])> {
        self.rows.iter().map(|(i, row)| (*i, row.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_columns_sorted() {
        let mut m: SparseMatrix<i32> = SparseMatrix::new();
        for col in [5u32, 1, 9, 3, 7] {
            *m.get_or_insert(0, col) = col as i32;
        }
        let cols: Vec<u32> = m.row(0).iter().map(|item| item.col).collect();
        assert_eq!(cols, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_long_row_bisection() {
        let mut m: SparseMatrix<f64> = SparseMatrix::new();
        // Twice the linear scan threshold to exercise the binary search path
        for col in 0..2 * LINEAR_SCAN_MAX as u32 {
            *m.get_or_insert(1, 3 * col) = f64::from(col);
        }
        assert_eq!(m.get(1, 33), Some(11.0));
        assert_eq!(m.get(1, 34), None);
    }

    #[test]
    fn test_at_missing_element() {
        let m: SparseMatrix<f64> = SparseMatrix::new();
        assert!(matches!(m.at(0, 0), Err(MeasureError::NotFound(_))));
    }

    #[test]
    fn test_rows_insertion_order() {
        let mut m: SparseMatrix<i32> = SparseMatrix::new();
        *m.get_or_insert(7, 0) = 1;
        *m.get_or_insert(2, 0) = 2;
        *m.get_or_insert(5, 0) = 3;
        let rows: Vec<u32> = m.rows().map(|(i, _)| i).collect();
        assert_eq!(rows, vec![7, 2, 5]);
    }
}
