//! Operation metadata and the borrowed sparsity pattern.
//!
//! [`CooInfo`] is the `(shape, rows_sorted, cols_sorted)` tuple passed with the raw arrays
//! whenever an operation runs below the container level. [`Pattern`] is the borrowed
//! `(row, col)` pair. Index arrays only ever reach a kernel or a differentiation rule through
//! a `Pattern`, which has no tangent slot, so they cannot be differentiated.

use num_traits::ToPrimitive;

use crate::core::traits::IndexType;
use crate::error::{CooError, Result};

/// The `(data, row, col)` buffers of a COO matrix.
pub type CooBuffers<T, I> = (Vec<T>, Vec<I>, Vec<I>);

/// Shape plus layout hints. The flags are never re-validated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CooInfo {
    pub shape: (usize, usize),
    pub rows_sorted: bool,
    pub cols_sorted: bool,
}

impl CooInfo {
    /// Metadata with both layout hints unset.
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            shape,
            rows_sorted: false,
            cols_sorted: false,
        }
    }

    pub fn with_rows_sorted(mut self, rows_sorted: bool) -> Self {
        self.rows_sorted = rows_sorted;
        self
    }

    pub fn with_cols_sorted(mut self, cols_sorted: bool) -> Self {
        self.cols_sorted = cols_sorted;
        self
    }

    /// Metadata of the transposed matrix: shape reversed, flags swapped.
    pub fn transposed(self) -> Self {
        Self {
            shape: (self.shape.1, self.shape.0),
            rows_sorted: self.cols_sorted,
            cols_sorted: self.rows_sorted,
        }
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }
}

/// Borrowed row and column indices of a COO matrix.
#[derive(Copy, Clone, Debug)]
pub struct Pattern<'a, I> {
    pub row: &'a [I],
    pub col: &'a [I],
}

impl<'a, I: IndexType> Pattern<'a, I> {
    pub fn new(row: &'a [I], col: &'a [I]) -> Self {
        Self { row, col }
    }

    /// Number of specified entries.
    pub fn nse(&self) -> usize {
        self.row.len()
    }

    /// Swaps the roles of `row` and `col`.
    pub fn swapped(self) -> Self {
        Self {
            row: self.col,
            col: self.row,
        }
    }

    /// Swaps the roles of `row` and `col` when `transpose` is set.
    pub fn oriented(self, transpose: bool) -> Self {
        if transpose { self.swapped() } else { self }
    }

    /// Checks that both arrays match `nse` and every coordinate lies inside `shape`.
    pub fn validate(&self, nse: usize, shape: (usize, usize)) -> Result<()> {
        if self.row.len() != nse || self.col.len() != nse {
            return Err(CooError::LengthMismatch {
                data: nse,
                row: self.row.len(),
                col: self.col.len(),
            });
        }
        for (index, (&r, &c)) in self.row.iter().zip(self.col).enumerate() {
            let in_rows = r.to_usize().is_some_and(|r| r < shape.0);
            let in_cols = c.to_usize().is_some_and(|c| c < shape.1);
            if !in_rows || !in_cols {
                return Err(CooError::IndexOutOfBounds {
                    index,
                    row: r.to_i128().unwrap_or(i128::MAX),
                    col: c.to_i128().unwrap_or(i128::MAX),
                    shape,
                });
            }
        }
        Ok(())
    }

    /// Whether entries are in lexicographic `(row, col)` order.
    pub fn is_row_sorted(&self) -> bool {
        self.row
            .iter()
            .zip(self.col)
            .zip(self.row.iter().zip(self.col).skip(1))
            .all(|(a, b)| (a.0, a.1) <= (b.0, b.1))
    }
}
