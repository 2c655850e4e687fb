//! Dense-array helpers on top of Faer.
//!
//! Faer's `Mat<T>` is the dense 2-D array throughout the crate. Only the generic part of its
//! API (`from_fn`, indexing, `nrows`/`ncols`) is used, so integer element types work too.

use faer::{Mat, MatRef};

use crate::core::traits::{IndexType, Scalar};
use crate::matrix::info::Pattern;

/// An `nrows x ncols` matrix of zeros.
pub fn zeros<T: Scalar>(nrows: usize, ncols: usize) -> Mat<T> {
    Mat::from_fn(nrows, ncols, |_, _| T::zero())
}

/// Build from row-major storage.
pub fn from_row_major<T: Scalar>(nrows: usize, ncols: usize, data: &[T]) -> Mat<T> {
    debug_assert_eq!(data.len(), nrows * ncols);
    Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j])
}

/// Owned transpose.
pub fn transposed<T: Scalar>(mat: MatRef<'_, T>) -> Mat<T> {
    Mat::from_fn(mat.ncols(), mat.nrows(), |i, j| mat[(j, i)])
}

/// Rows as nested vectors, mostly for comparisons.
pub fn to_rows<T: Scalar>(mat: MatRef<'_, T>) -> Vec<Vec<T>> {
    (0..mat.nrows())
        .map(|i| (0..mat.ncols()).map(|j| mat[(i, j)]).collect())
        .collect()
}

/// Gather `mat` at the pattern coordinates: `out[i] = mat[row[i], col[i]]`.
pub fn extract<T: Scalar, I: IndexType>(pattern: Pattern<'_, I>, mat: MatRef<'_, T>) -> Vec<T> {
    pattern
        .row
        .iter()
        .zip(pattern.col)
        .map(|(&r, &c)| mat[(r.index(), c.index())])
        .collect()
}

/// Number of entries different from zero.
pub fn count_nonzero<T: Scalar>(mat: MatRef<'_, T>) -> usize {
    let zero = T::zero();
    let mut n = 0;
    for i in 0..mat.nrows() {
        for j in 0..mat.ncols() {
            if mat[(i, j)] != zero {
                n += 1;
            }
        }
    }
    n
}
