//! Free-function entry points on the global [`SparseContext`].
//!
//! ```rust
//! use spcoo::ops::{coo_fromdense, coo_matvec, coo_todense};
//!
//! let dense = faer::Mat::from_fn(2, 3, |i, j| if i == j { 2.0 } else { 0.0 });
//! let coo = coo_fromdense::<f64, i32>(dense.as_ref(), None).unwrap();
//! assert_eq!(coo.nse(), 2);
//! assert_eq!(coo_matvec(&coo, &[1.0, 1.0, 1.0], false).unwrap(), vec![2.0, 2.0]);
//! assert_eq!(coo_todense(&coo).unwrap()[(1, 1)], 2.0);
//! ```

use faer::{Mat, MatRef};

use crate::context::SparseContext;
use crate::core::{IndexType, Scalar};
use crate::error::Result;
use crate::matrix::coo::CooMatrix;

pub fn coo_todense<T: Scalar, I: IndexType>(mat: &CooMatrix<T, I>) -> Result<Mat<T>> {
    SparseContext::global().todense(mat)
}

/// `nse` defaults to the number of nonzeros in `mat`.
pub fn coo_fromdense<T: Scalar, I: IndexType>(
    mat: MatRef<'_, T>,
    nse: Option<usize>,
) -> Result<CooMatrix<T, I>> {
    SparseContext::global().fromdense(mat, nse)
}

pub fn coo_matvec<T: Scalar, I: IndexType>(
    mat: &CooMatrix<T, I>,
    v: &[T],
    transpose: bool,
) -> Result<Vec<T>> {
    SparseContext::global().matvec(mat, v, transpose)
}

pub fn coo_matmat<T: Scalar, I: IndexType>(
    mat: &CooMatrix<T, I>,
    b: MatRef<'_, T>,
    transpose: bool,
) -> Result<Mat<T>> {
    SparseContext::global().matmat(mat, b, transpose)
}
