//! Abstract values: the shape and dtype of an array without its contents.
//!
//! Shape inference for every primitive is written against [`ShapedArray`] so it can be run
//! for static checking before any kernel executes.

use faer::MatRef;

use crate::core::traits::{DType, IndexType, Scalar};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapedArray {
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl ShapedArray {
    pub fn new(shape: impl Into<Vec<usize>>, dtype: DType) -> Self {
        Self {
            shape: shape.into(),
            dtype,
        }
    }

    pub fn vector(len: usize, dtype: DType) -> Self {
        Self::new(vec![len], dtype)
    }

    pub fn matrix(nrows: usize, ncols: usize, dtype: DType) -> Self {
        Self::new(vec![nrows, ncols], dtype)
    }

    pub fn of_values<T: Scalar>(values: &[T]) -> Self {
        Self::vector(values.len(), T::DTYPE)
    }

    pub fn of_indices<I: IndexType>(indices: &[I]) -> Self {
        Self::vector(indices.len(), I::DTYPE)
    }

    pub fn of_mat<T: Scalar>(mat: MatRef<'_, T>) -> Self {
        Self::matrix(mat.nrows(), mat.ncols(), T::DTYPE)
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}
