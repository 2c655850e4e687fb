//! The kernel interface a lowering executes.
//!
//! Inputs are assumed validated: lengths agree, indices are inside `shape` and dtypes match.
//! Implementations other than [`ReferenceKernels`] may additionally assume the pattern is in
//! row-sorted order for `todense`, `matvec` and `matmat`.

use faer::{Mat, MatRef};

use crate::core::{IndexType, Scalar};
use crate::error::Result;
use crate::matrix::info::{CooBuffers, CooInfo, Pattern};
use crate::primitive::{fromdense, matmat, matvec, todense};

pub trait CooKernels {
    fn todense<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        shape: (usize, usize),
    ) -> Mat<T>;

    fn fromdense<T: Scalar, I: IndexType>(&self, mat: MatRef<'_, T>, nse: usize) -> Result<CooBuffers<T, I>>;

    fn matvec<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        v: &[T],
        shape: (usize, usize),
        transpose: bool,
    ) -> Vec<T>;

    fn matmat<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        b: MatRef<'_, T>,
        shape: (usize, usize),
        transpose: bool,
    ) -> Mat<T>;
}

/// The scatter/gather kernels of the primitive modules.
#[derive(Copy, Clone, Debug, Default)]
pub struct ReferenceKernels;

impl CooKernels for ReferenceKernels {
    fn todense<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        shape: (usize, usize),
    ) -> Mat<T> {
        todense::reference(data, pattern, &CooInfo::new(shape))
    }

    fn fromdense<T: Scalar, I: IndexType>(&self, mat: MatRef<'_, T>, nse: usize) -> Result<CooBuffers<T, I>> {
        fromdense::reference(mat, nse)
    }

    fn matvec<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        v: &[T],
        shape: (usize, usize),
        transpose: bool,
    ) -> Vec<T> {
        matvec::reference(data, pattern, v, &CooInfo::new(shape), transpose)
    }

    fn matmat<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        b: MatRef<'_, T>,
        shape: (usize, usize),
        transpose: bool,
    ) -> Mat<T> {
        matmat::reference(data, pattern, b, &CooInfo::new(shape), transpose)
    }
}
