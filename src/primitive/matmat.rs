//! `coo_matmat`: product of a COO matrix and a dense matrix.

use faer::{Mat, MatRef};

use crate::context::SparseContext;
use crate::core::{IndexType, Scalar, ShapedArray};
use crate::error::{CooError, Result};
use crate::matrix::dense::zeros;
use crate::matrix::info::{CooInfo, Pattern};
use crate::primitive::ad::{Cotangent, Primal, Tangent, add_tangents};
use crate::primitive::matvec::dims;
use crate::primitive::{PrimitiveDef, PrimitiveKind, check_triplet};

const NAME: &str = "coo_matmat";

pub fn abstract_eval(
    data: &ShapedArray,
    row: &ShapedArray,
    col: &ShapedArray,
    b: &ShapedArray,
    spinfo: &CooInfo,
    transpose: bool,
) -> Result<ShapedArray> {
    check_triplet(NAME, data, row, col)?;
    if data.dtype != b.dtype {
        return Err(CooError::DtypeMismatch {
            op: NAME,
            expected: data.dtype,
            found: b.dtype,
        });
    }
    if b.ndim() != 2 {
        return Err(CooError::Rank {
            op: NAME,
            ndim: b.ndim(),
        });
    }
    let (n_in, n_out) = dims(spinfo, transpose);
    if b.shape[0] != n_in {
        return Err(CooError::ShapeMismatch {
            op: NAME,
            detail: format!(
                "right-hand side has {} rows, expected {n_in} for shape {:?} (transpose={transpose})",
                b.shape[0], spinfo.shape
            ),
        });
    }
    Ok(ShapedArray::matrix(n_out, b.shape[1], data.dtype))
}

/// `C[row[i], :] += data[i] * B[col[i], :]`, index roles swapped when `transpose` is set.
pub fn reference<T: Scalar, I: IndexType>(
    data: &[T],
    pattern: Pattern<'_, I>,
    b: MatRef<'_, T>,
    spinfo: &CooInfo,
    transpose: bool,
) -> Mat<T> {
    let pattern = pattern.oriented(transpose);
    let (_, n_out) = dims(spinfo, transpose);
    let k = b.ncols();
    let mut out = zeros(n_out, k);
    for ((&d, &r), &c) in data.iter().zip(pattern.row).zip(pattern.col) {
        let (r, c) = (r.index(), c.index());
        for j in 0..k {
            out[(r, j)] += d * b[(c, j)];
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
pub fn jvp<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    data: &[T],
    data_dot: Tangent<&[T]>,
    pattern: Pattern<'_, I>,
    b: MatRef<'_, T>,
    b_dot: Tangent<MatRef<'_, T>>,
    spinfo: &CooInfo,
    transpose: bool,
) -> Result<Tangent<Mat<T>>> {
    let from_data = match data_dot {
        Tangent::Zero => Tangent::Zero,
        Tangent::Value(d) => Tangent::Value(ctx.matmat_raw(d, pattern, b, spinfo, transpose)?),
    };
    let from_b = match b_dot {
        Tangent::Zero => Tangent::Zero,
        Tangent::Value(bd) => Tangent::Value(ctx.matmat_raw(data, pattern, bd, spinfo, transpose)?),
    };
    Ok(add_tangents(from_data, from_b, |x, y| {
        Mat::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] + y[(i, j)])
    }))
}

/// Like the matvec rule; the data cotangent is the row-wise dot product
/// `sum_k ct[row[i], k] * B[col[i], k]`.
pub fn transpose<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    ct: MatRef<'_, T>,
    data: Primal<&[T]>,
    pattern: Pattern<'_, I>,
    b: Primal<MatRef<'_, T>>,
    spinfo: &CooInfo,
    transpose: bool,
) -> Result<Cotangent<T, Mat<T>>> {
    match (data, b) {
        (Primal::Known(data), Primal::Linear) => ctx
            .matmat_raw(data, pattern, ct, spinfo, !transpose)
            .map(Cotangent::Operand),
        (Primal::Linear, Primal::Known(b)) => {
            let (n_in, n_out) = dims(spinfo, transpose);
            if ct.nrows() != n_out || b.nrows() != n_in || ct.ncols() != b.ncols() {
                return Err(CooError::ShapeMismatch {
                    op: NAME,
                    detail: format!(
                        "cotangent {:?} and right-hand side {:?} do not match shape {:?} (transpose={transpose})",
                        (ct.nrows(), ct.ncols()),
                        (b.nrows(), b.ncols()),
                        spinfo.shape
                    ),
                });
            }
            pattern.validate(pattern.nse(), spinfo.shape)?;
            let p = pattern.oriented(transpose);
            let data_ct = p
                .row
                .iter()
                .zip(p.col)
                .map(|(&r, &c)| {
                    let (r, c) = (r.index(), c.index());
                    let mut acc = T::zero();
                    for j in 0..b.ncols() {
                        acc += ct[(r, j)] * b[(c, j)];
                    }
                    acc
                })
                .collect();
            Ok(Cotangent::Data(data_ct))
        }
        _ => Err(CooError::NotLinear(NAME)),
    }
}

pub type MatmatDef<T, I> = PrimitiveDef<
    fn(&ShapedArray, &ShapedArray, &ShapedArray, &ShapedArray, &CooInfo, bool) -> Result<ShapedArray>,
    fn(&[T], Pattern<'_, I>, MatRef<'_, T>, &CooInfo, bool) -> Mat<T>,
    fn(
        &SparseContext,
        &[T],
        Tangent<&[T]>,
        Pattern<'_, I>,
        MatRef<'_, T>,
        Tangent<MatRef<'_, T>>,
        &CooInfo,
        bool,
    ) -> Result<Tangent<Mat<T>>>,
    fn(
        &SparseContext,
        MatRef<'_, T>,
        Primal<&[T]>,
        Pattern<'_, I>,
        Primal<MatRef<'_, T>>,
        &CooInfo,
        bool,
    ) -> Result<Cotangent<T, Mat<T>>>,
>;

pub fn def<T: Scalar, I: IndexType>() -> MatmatDef<T, I> {
    PrimitiveDef {
        kind: PrimitiveKind::CooMatmat,
        abstract_eval,
        reference: reference::<T, I>,
        jvp: jvp::<T, I>,
        transpose: transpose::<T, I>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DType;
    use crate::matrix::dense::{from_row_major, to_rows};

    #[test]
    fn reference_product_with_duplicates() {
        // [[1, 0], [0, 2]] stored with the (1, 1) entry split in two
        let data = [1.0, 1.5, 0.5];
        let row = [0i32, 1, 1];
        let col = [0i32, 1, 1];
        let b = from_row_major(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let c = reference(&data, Pattern::new(&row, &col), b.as_ref(), &CooInfo::new((2, 2)), false);
        assert_eq!(to_rows(c.as_ref()), vec![vec![1.0, 2.0], vec![6.0, 8.0]]);
    }

    #[test]
    fn abstract_eval_output_shape() {
        let data = ShapedArray::vector(4, DType::C64);
        let idx = ShapedArray::vector(4, DType::I64);
        let info = CooInfo::new((3, 5));
        let out = abstract_eval(&data, &idx, &idx, &ShapedArray::matrix(3, 7, DType::C64), &info, true);
        assert_eq!(out.unwrap(), ShapedArray::matrix(5, 7, DType::C64));
        let bad = abstract_eval(&data, &idx, &idx, &ShapedArray::vector(5, DType::C64), &info, false);
        assert!(matches!(bad, Err(CooError::Rank { ndim: 1, .. })));
    }
}
