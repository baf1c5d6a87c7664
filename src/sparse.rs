//! # Sparse binary parity check matrix
//!
//! This module implements the sparse representation of a parity check matrix
//! that every decoder in this crate consumes. The matrix is stored as row and
//! column adjacency lists, which is the natural access pattern for iterative
//! decoding: check node passes walk the rows, variable node passes walk the
//! columns.

use std::borrow::Borrow;
use std::slice::Iter;

/// A [`String`] with a description of the error.
pub type Error = String;
/// A [`Result`] type containing an error [`String`].
pub type Result<T> = std::result::Result<T, Error>;

/// A sparse binary matrix
///
/// For each row the matrix stores the ordered list of columns holding a one,
/// and for each column the ordered list of rows holding a one. Decoders only
/// ever read the matrix through these adjacency lists and share it behind an
/// [`Arc`](std::sync::Arc), so it is never mutated nor copied per decoder.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SparseMatrix {
    rows: Vec<Vec<usize>>,
    cols: Vec<Vec<usize>>,
}

impl SparseMatrix {
    /// Create a new sparse matrix of a given size
    ///
    /// The matrix is initialized to the zero matrix.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_decoders::sparse::SparseMatrix;
    /// let h = SparseMatrix::new(10, 30);
    /// assert_eq!(h.num_rows(), 10);
    /// assert_eq!(h.num_cols(), 30);
    /// ```
    pub fn new(nrows: usize, ncols: usize) -> SparseMatrix {
        use std::iter::repeat_with;
        let rows = repeat_with(Vec::new).take(nrows).collect();
        let cols = repeat_with(Vec::new).take(ncols).collect();
        SparseMatrix { rows, cols }
    }

    /// Builds a sparse matrix from dense bit rows
    ///
    /// Each element of `rows` describes one matrix row as a slice of values,
    /// where a nonzero entry marks a one. All rows must have the same length.
    ///
    /// # Errors
    /// If two rows have different lengths, an error is returned.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_decoders::sparse::SparseMatrix;
    /// let h = SparseMatrix::from_bit_rows([[1u8, 0, 1, 0], [0, 1, 0, 1]]).unwrap();
    /// assert!(h.contains(0, 2));
    /// assert!(!h.contains(1, 2));
    /// ```
    pub fn from_bit_rows<I, R>(rows: I) -> Result<SparseMatrix>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let mut row_cols = Vec::new();
        let mut ncols = None;
        for row in rows {
            let row = row.as_ref();
            match ncols {
                None => ncols = Some(row.len()),
                Some(n) if n != row.len() => {
                    return Err(String::from("bit rows have differing lengths"));
                }
                Some(_) => (),
            }
            let cols: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|&(_, &b)| b != 0)
                .map(|(j, _)| j)
                .collect();
            row_cols.push(cols);
        }
        let mut h = SparseMatrix::new(row_cols.len(), ncols.unwrap_or(0));
        for (i, cols) in row_cols.iter().enumerate() {
            h.insert_row(i, cols.iter());
        }
        Ok(h)
    }

    /// Returns the number of rows of the matrix
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns of the matrix
    pub fn num_cols(&self) -> usize {
        self.cols.len()
    }

    /// Returns the row weight of `row`
    ///
    /// The row weight is defined as the number of entries equal to
    /// one in a particular row. Rows are indexed starting by zero.
    pub fn row_weight(&self, row: usize) -> usize {
        self.rows[row].len()
    }

    /// Returns the column weight of `column`
    ///
    /// The column weight is defined as the number of entries equal to
    /// one in a particular column. Columns are indexed starting by zero.
    pub fn col_weight(&self, col: usize) -> usize {
        self.cols[col].len()
    }

    /// Returns the common row weight of a row-regular matrix
    ///
    /// If every row of the matrix has the same weight, that weight is
    /// returned. Otherwise, or if the matrix has no rows, `None` is returned.
    /// Majority logic decoding only applies to row-regular matrices, so the
    /// decoders in that family use this query to validate their matrix.
    pub fn uniform_row_weight(&self) -> Option<usize> {
        let weight = self.rows.first()?.len();
        self.rows
            .iter()
            .all(|r| r.len() == weight)
            .then_some(weight)
    }

    /// Returns `true` if the entry corresponding to a particular
    /// row and column is a one
    pub fn contains(&self, row: usize, col: usize) -> bool {
        // typically columns are shorter, so we search in the column
        self.cols[col].contains(&row)
    }

    /// Inserts a one in a particular row and column
    ///
    /// # Examples
    /// ```
    /// # use ldpc_decoders::sparse::SparseMatrix;
    /// let mut h = SparseMatrix::new(10, 30);
    /// assert!(!h.contains(3, 7));
    /// h.insert(3, 7);
    /// assert!(h.contains(3, 7));
    /// ```
    pub fn insert(&mut self, row: usize, col: usize) {
        self.rows[row].push(col);
        self.cols[col].push(row);
    }

    /// Inserts ones in particular columns of a row
    ///
    /// The effect is as calling `insert()` on each of the elements
    /// of the iterator `cols`.
    pub fn insert_row<T, S>(&mut self, row: usize, cols: T)
    where
        T: Iterator<Item = S>,
        S: Borrow<usize>,
    {
        for col in cols {
            self.insert(row, *col.borrow());
        }
    }

    /// Returns an [Iterator] over the entries equal to one
    /// in a particular row
    pub fn iter_row(&self, row: usize) -> Iter<'_, usize> {
        self.rows[row].iter()
    }

    /// Returns an [Iterator] over the entries equal to one
    /// in a particular column
    pub fn iter_col(&self, col: usize) -> Iter<'_, usize> {
        self.cols[col].iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert() {
        let mut h = SparseMatrix::new(100, 300);
        assert!(!h.contains(27, 154));
        h.insert(27, 154);
        assert!(h.contains(27, 154));
        assert!(!h.contains(28, 154));
    }

    #[test]
    fn test_from_bit_rows() {
        let mut expected = SparseMatrix::new(3, 5);
        expected.insert_row(0, [0usize, 2, 4].iter());
        expected.insert_row(1, [1usize, 2].iter());
        expected.insert_row(2, [3usize].iter());
        let h = SparseMatrix::from_bit_rows([
            [1u8, 0, 1, 0, 1],
            [0, 1, 1, 0, 0],
            [0, 0, 0, 1, 0],
        ])
        .unwrap();
        assert_eq!(h, expected);
    }

    #[test]
    fn test_from_bit_rows_length_mismatch() {
        let rows: [&[u8]; 2] = [&[1, 0, 1], &[0, 1]];
        assert!(SparseMatrix::from_bit_rows(rows).is_err());
    }

    #[test]
    fn test_uniform_row_weight() {
        let mut h = SparseMatrix::new(3, 6);
        h.insert_row(0, [0usize, 1, 3].iter());
        h.insert_row(1, [1usize, 2, 4].iter());
        h.insert_row(2, [0usize, 4, 5].iter());
        assert_eq!(h.uniform_row_weight(), Some(3));
        h.insert(2, 3);
        assert_eq!(h.uniform_row_weight(), None);
    }
}
