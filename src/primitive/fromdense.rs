//! `coo_fromdense`: collect the nonzero entries of a dense matrix.
//!
//! Exactly `nse` entries are produced. Nonzeros are taken in row-major order; when the matrix
//! has more than `nse` of them only the first `nse` are kept, and when it has fewer the output
//! is padded with zero-valued entries at `(0, 0)`. Derivative rules rely on this ordering.

use faer::{Mat, MatRef};

use crate::context::SparseContext;
use crate::core::{DType, IndexType, Scalar, ShapedArray};
use crate::error::{CooError, Result};
use crate::matrix::dense::extract;
use crate::matrix::info::{CooBuffers, CooInfo, Pattern};
use crate::primitive::ad::Tangent;
use crate::primitive::{PrimitiveDef, PrimitiveKind};

const NAME: &str = "coo_fromdense";

pub fn abstract_eval(mat: &ShapedArray, nse: usize, index_dtype: DType) -> Result<[ShapedArray; 3]> {
    if mat.ndim() != 2 {
        return Err(CooError::Rank {
            op: NAME,
            ndim: mat.ndim(),
        });
    }
    if !index_dtype.is_integer() {
        return Err(CooError::DtypeMismatch {
            op: NAME,
            expected: DType::I32,
            found: index_dtype,
        });
    }
    Ok([
        ShapedArray::vector(nse, mat.dtype),
        ShapedArray::vector(nse, index_dtype),
        ShapedArray::vector(nse, index_dtype),
    ])
}

pub fn reference<T: Scalar, I: IndexType>(mat: MatRef<'_, T>, nse: usize) -> Result<CooBuffers<T, I>> {
    let zero = T::zero();
    let ncols = mat.ncols();
    let nonzeros = (0..mat.nrows())
        .flat_map(move |i| (0..ncols).map(move |j| (i, j)))
        .filter_map(|(i, j)| {
            let v = mat[(i, j)];
            (v != zero).then_some((i, j, v))
        });
    assemble(nonzeros, nse, (mat.nrows(), mat.ncols()))
}

/// Takes the first `nse` entries of `entries` and pads the remainder.
pub(crate) fn assemble<T: Scalar, I: IndexType>(
    entries: impl Iterator<Item = (usize, usize, T)>,
    nse: usize,
    shape: (usize, usize),
) -> Result<CooBuffers<T, I>> {
    let mut data: Vec<T> = Vec::new();
    let mut row: Vec<I> = Vec::new();
    let mut col: Vec<I> = Vec::new();
    let reserved = data
        .try_reserve_exact(nse)
        .and_then(|()| row.try_reserve_exact(nse))
        .and_then(|()| col.try_reserve_exact(nse));
    if reserved.is_err() {
        return Err(CooError::Allocation { op: NAME, nse });
    }
    for (i, j, v) in entries.take(nse) {
        data.push(v);
        row.push(I::from_index(i)?);
        col.push(I::from_index(j)?);
    }
    if data.len() < nse {
        if shape.0 == 0 || shape.1 == 0 {
            return Err(CooError::ShapeMismatch {
                op: NAME,
                detail: format!("cannot pad to nse={nse} in a matrix of shape {shape:?}"),
            });
        }
        let origin = I::from_index(0)?;
        data.resize(nse, T::zero());
        row.resize(nse, origin);
        col.resize(nse, origin);
    }
    Ok((data, row, col))
}

/// Tangents of the three outputs. The index tangents are always `Zero`.
#[derive(Clone, Debug, PartialEq)]
pub struct FromdenseTangents<T, I> {
    pub data: Tangent<Vec<T>>,
    pub row: Tangent<Vec<I>>,
    pub col: Tangent<Vec<I>>,
}

/// Cotangents of the three outputs. The index cotangents must be `Zero`.
#[derive(Clone, Debug)]
pub struct FromdenseCotangents<'a, T, I> {
    pub data: &'a [T],
    pub row: Tangent<&'a [I]>,
    pub col: Tangent<&'a [I]>,
}

impl<'a, T, I> FromdenseCotangents<'a, T, I> {
    /// Cotangent on `data` only.
    pub fn data(data: &'a [T]) -> Self {
        Self {
            data,
            row: Tangent::Zero,
            col: Tangent::Zero,
        }
    }
}

/// Evaluates the primal and gathers the tangent of `mat` at the primal coordinates.
pub fn jvp<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    mat: MatRef<'_, T>,
    mat_dot: Tangent<MatRef<'_, T>>,
    nse: usize,
) -> Result<(CooBuffers<T, I>, FromdenseTangents<T, I>)> {
    let primal: CooBuffers<T, I> = ctx.fromdense_raw(mat, nse)?;
    let data_dot = match mat_dot {
        Tangent::Zero => Tangent::Zero,
        Tangent::Value(m_dot) => {
            if (m_dot.nrows(), m_dot.ncols()) != (mat.nrows(), mat.ncols()) {
                return Err(CooError::ShapeMismatch {
                    op: NAME,
                    detail: format!(
                        "tangent has shape {:?}, primal has {:?}",
                        (m_dot.nrows(), m_dot.ncols()),
                        (mat.nrows(), mat.ncols())
                    ),
                });
            }
            Tangent::Value(extract(Pattern::new(&primal.1, &primal.2), m_dot))
        }
    };
    let tangents = FromdenseTangents {
        data: data_dot,
        row: Tangent::Zero,
        col: Tangent::Zero,
    };
    Ok((primal, tangents))
}

/// Scatters the data cotangent back into a dense matrix of `mat_shape`.
pub fn transpose<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    ct: FromdenseCotangents<'_, T, I>,
    pattern: Pattern<'_, I>,
    mat_shape: (usize, usize),
) -> Result<Mat<T>> {
    if !ct.row.is_zero() {
        return Err(CooError::NonDifferentiable {
            primitive: NAME,
            arg: "row",
        });
    }
    if !ct.col.is_zero() {
        return Err(CooError::NonDifferentiable {
            primitive: NAME,
            arg: "col",
        });
    }
    ctx.todense_raw(ct.data, pattern, &CooInfo::new(mat_shape))
}

pub type FromdenseDef<T, I> = PrimitiveDef<
    fn(&ShapedArray, usize, DType) -> Result<[ShapedArray; 3]>,
    fn(MatRef<'_, T>, usize) -> Result<CooBuffers<T, I>>,
    fn(
        &SparseContext,
        MatRef<'_, T>,
        Tangent<MatRef<'_, T>>,
        usize,
    ) -> Result<(CooBuffers<T, I>, FromdenseTangents<T, I>)>,
    fn(&SparseContext, FromdenseCotangents<'_, T, I>, Pattern<'_, I>, (usize, usize)) -> Result<Mat<T>>,
>;

pub fn def<T: Scalar, I: IndexType>() -> FromdenseDef<T, I> {
    PrimitiveDef {
        kind: PrimitiveKind::CooFromdense,
        abstract_eval,
        reference: reference::<T, I>,
        jvp: jvp::<T, I>,
        transpose: transpose::<T, I>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::dense::from_row_major;

    #[test]
    fn truncates_to_first_row_major_nonzeros() {
        let m = from_row_major(2, 3, &[0.0, 1.0, 2.0, 3.0, 0.0, 4.0]);
        let (data, row, col) = reference::<f64, i32>(m.as_ref(), 3).unwrap();
        assert_eq!(data, vec![1.0, 2.0, 3.0]);
        assert_eq!(row, vec![0, 0, 1]);
        assert_eq!(col, vec![1, 2, 0]);
    }

    #[test]
    fn pads_with_origin_entries() {
        let m = from_row_major(2, 2, &[0.0, 7.0, 0.0, 0.0]);
        let (data, row, col) = reference::<f64, i64>(m.as_ref(), 3).unwrap();
        assert_eq!(data, vec![7.0, 0.0, 0.0]);
        assert_eq!(row, vec![0, 0, 0]);
        assert_eq!(col, vec![1, 0, 0]);
    }

    #[test]
    fn padding_an_empty_shape_fails() {
        let m = from_row_major::<f64>(0, 4, &[]);
        assert!(reference::<f64, i32>(m.as_ref(), 0).is_ok());
        assert!(matches!(
            reference::<f64, i32>(m.as_ref(), 1),
            Err(CooError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn oversized_nse_is_an_error() {
        let m = from_row_major(2, 2, &[1.0f64, 0.0, 0.0, 2.0]);
        assert_eq!(
            reference::<f64, i32>(m.as_ref(), usize::MAX),
            Err(CooError::Allocation {
                op: NAME,
                nse: usize::MAX
            })
        );
    }

    #[test]
    fn abstract_eval_shapes() {
        let [d, r, c] = abstract_eval(&ShapedArray::matrix(3, 4, DType::F32), 5, DType::I64).unwrap();
        assert_eq!(d, ShapedArray::vector(5, DType::F32));
        assert_eq!(r, ShapedArray::vector(5, DType::I64));
        assert_eq!(c, r);
        assert!(abstract_eval(&ShapedArray::vector(3, DType::F32), 1, DType::I32).is_err());
        assert!(abstract_eval(&ShapedArray::matrix(3, 3, DType::F32), 1, DType::F64).is_err());
    }
}
