//! The COO sparse matrix container.
//!
//! A [`CooMatrix`] stores `nse` specified entries as three parallel arrays `data`, `row` and
//! `col` plus a shape. Duplicate coordinates are legal and sum. The `rows_sorted` and
//! `cols_sorted` flags are layout hints for dispatch and are never re-checked.

use faer::{Mat, MatRef};

use crate::context::SparseContext;
use crate::core::{DType, IndexType, Scalar};
use crate::error::{CooError, Result};
use crate::matrix::dense::from_row_major;
use crate::matrix::info::{CooBuffers, CooInfo, Pattern};

#[derive(Clone, Debug, PartialEq)]
pub struct CooMatrix<T, I = i32> {
    data: Vec<T>,
    row: Vec<I>,
    col: Vec<I>,
    info: CooInfo,
}

/// Right-hand side of [`CooMatrix::matmul`].
#[derive(Copy, Clone, Debug)]
pub enum Operand<'a, T, I = i32> {
    Vector(&'a [T]),
    Matrix(MatRef<'a, T>),
    Sparse(&'a CooMatrix<T, I>),
    /// Row-major array of arbitrary rank.
    Array { shape: &'a [usize], data: &'a [T] },
}

/// Result of [`CooMatrix::matmul`].
#[derive(Clone, Debug)]
pub enum Product<T> {
    Vector(Vec<T>),
    Matrix(Mat<T>),
}

impl<T> Product<T> {
    pub fn into_vector(self) -> Option<Vec<T>> {
        match self {
            Product::Vector(v) => Some(v),
            Product::Matrix(_) => None,
        }
    }

    pub fn into_matrix(self) -> Option<Mat<T>> {
        match self {
            Product::Matrix(m) => Some(m),
            Product::Vector(_) => None,
        }
    }
}

impl<T: Scalar, I: IndexType> CooMatrix<T, I> {
    /// Checked constructor with both layout hints unset.
    pub fn new(data: Vec<T>, row: Vec<I>, col: Vec<I>, shape: (usize, usize)) -> Result<Self> {
        Self::from_parts(data, row, col, CooInfo::new(shape))
    }

    /// Checked constructor taking the hints from `info`.
    pub fn from_parts(data: Vec<T>, row: Vec<I>, col: Vec<I>, info: CooInfo) -> Result<Self> {
        Pattern::new(&row, &col).validate(data.len(), info.shape)?;
        Ok(Self {
            data,
            row,
            col,
            info,
        })
    }

    /// Rebuilds a matrix from [`flatten`](Self::flatten) output.
    pub fn unflatten(buffers: CooBuffers<T, I>, info: CooInfo) -> Result<Self> {
        let (data, row, col) = buffers;
        Self::from_parts(data, row, col, info)
    }

    /// Splits into the array children and the static metadata.
    pub fn flatten(self) -> (CooBuffers<T, I>, CooInfo) {
        ((self.data, self.row, self.col), self.info)
    }

    /// A matrix without stored entries. Trivially sorted both ways.
    pub fn empty(shape: (usize, usize)) -> Self {
        Self {
            data: Vec::new(),
            row: Vec::new(),
            col: Vec::new(),
            info: CooInfo::new(shape).with_rows_sorted(true).with_cols_sorted(true),
        }
    }

    /// Ones on the `k`-th diagonal of an `n x m` matrix; `k > 0` is above the main diagonal.
    pub fn eye(n: usize, m: usize, k: isize) -> Result<Self> {
        let n_i = isize::try_from(n).map_err(|_| CooError::IndexOverflow(n))?;
        let m_i = isize::try_from(m).map_err(|_| CooError::IndexOverflow(m))?;
        let diag_size = if k > 0 {
            n_i.min(m_i.saturating_sub(k))
        } else {
            n_i.saturating_add(k).min(m_i)
        };
        if diag_size <= 0 {
            return Ok(Self::empty((n, m)));
        }
        let diag_size = diag_size.unsigned_abs();
        let (row_off, col_off) = if k >= 0 {
            (0, k.unsigned_abs())
        } else {
            (k.unsigned_abs(), 0)
        };
        let row = (0..diag_size)
            .map(|i| I::from_index(i + row_off))
            .collect::<Result<Vec<_>>>()?;
        let col = (0..diag_size)
            .map(|i| I::from_index(i + col_off))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            data: vec![T::one(); diag_size],
            row,
            col,
            info: CooInfo::new((n, m)).with_rows_sorted(true).with_cols_sorted(true),
        })
    }

    /// Converts a dense matrix on the global context; see [`SparseContext::fromdense`].
    pub fn fromdense(mat: MatRef<'_, T>, nse: Option<usize>) -> Result<Self> {
        SparseContext::global().fromdense(mat, nse)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn row(&self) -> &[I] {
        &self.row
    }

    pub fn col(&self) -> &[I] {
        &self.col
    }

    pub fn pattern(&self) -> Pattern<'_, I> {
        Pattern::new(&self.row, &self.col)
    }

    pub fn info(&self) -> CooInfo {
        self.info
    }

    pub fn shape(&self) -> (usize, usize) {
        self.info.shape
    }

    /// Number of specified entries, duplicates and explicit zeros included.
    pub fn nse(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn index_dtype(&self) -> DType {
        I::DTYPE
    }

    pub fn rows_sorted(&self) -> bool {
        self.info.rows_sorted
    }

    pub fn cols_sorted(&self) -> bool {
        self.info.cols_sorted
    }

    /// Stable sort by `(row, col)`. Returns `self` untouched when already hinted row-sorted.
    pub fn sort_indices(self) -> Self {
        if self.info.rows_sorted {
            return self;
        }
        let mut perm: Vec<usize> = (0..self.nse()).collect();
        perm.sort_by_key(|&i| (self.row[i], self.col[i]));
        Self {
            data: perm.iter().map(|&i| self.data[i]).collect(),
            row: perm.iter().map(|&i| self.row[i]).collect(),
            col: perm.iter().map(|&i| self.col[i]).collect(),
            info: CooInfo::new(self.info.shape).with_rows_sorted(true),
        }
    }

    /// Swaps `row` and `col`; the shape and the layout hints swap with them.
    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.clone(),
            row: self.col.clone(),
            col: self.row.clone(),
            info: self.info.transposed(),
        }
    }

    /// Only the default axis order (`None`) is supported.
    pub fn transpose_axes(&self, axes: Option<&[usize]>) -> Result<Self> {
        match axes {
            None => Ok(self.transpose()),
            Some(_) => Err(CooError::Unsupported(
                "transpose with explicit axes is not implemented for COO matrices",
            )),
        }
    }

    pub fn todense(&self) -> Result<Mat<T>> {
        SparseContext::global().todense(self)
    }

    pub fn matvec(&self, v: &[T], transpose: bool) -> Result<Vec<T>> {
        SparseContext::global().matvec(self, v, transpose)
    }

    pub fn matmat(&self, b: MatRef<'_, T>, transpose: bool) -> Result<Mat<T>> {
        SparseContext::global().matmat(self, b, transpose)
    }

    /// `self @ other` on the global context.
    pub fn matmul(&self, other: Operand<'_, T, I>) -> Result<Product<T>> {
        match other {
            Operand::Vector(v) => self.matvec(v, false).map(Product::Vector),
            Operand::Matrix(b) => self.matmat(b, false).map(Product::Matrix),
            Operand::Sparse(_) => Err(CooError::Unsupported(
                "matmul between two sparse matrices is not implemented",
            )),
            Operand::Array { shape, data } => {
                let expected: usize = shape.iter().product();
                if expected != data.len() {
                    return Err(CooError::ShapeMismatch {
                        op: "matmul",
                        detail: format!("array of shape {shape:?} holds {} values", data.len()),
                    });
                }
                match *shape {
                    [_] => self.matvec(data, false).map(Product::Vector),
                    [nrows, ncols] => {
                        let b = from_row_major(nrows, ncols, data);
                        self.matmat(b.as_ref(), false).map(Product::Matrix)
                    }
                    _ => Err(CooError::Rank {
                        op: "matmul",
                        ndim: shape.len(),
                    }),
                }
            }
        }
    }
}
