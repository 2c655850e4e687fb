//! `coo_matvec`: product of a COO matrix and a dense vector.

use crate::context::SparseContext;
use crate::core::{IndexType, Scalar, ShapedArray};
use crate::error::{CooError, Result};
use crate::matrix::info::{CooInfo, Pattern};
use crate::primitive::ad::{Cotangent, Primal, Tangent, add_tangents};
use crate::primitive::{PrimitiveDef, PrimitiveKind, check_triplet};

const NAME: &str = "coo_matvec";

/// `(input length, output length)` of the product.
pub(crate) fn dims(spinfo: &CooInfo, transpose: bool) -> (usize, usize) {
    if transpose {
        (spinfo.nrows(), spinfo.ncols())
    } else {
        (spinfo.ncols(), spinfo.nrows())
    }
}

pub fn abstract_eval(
    data: &ShapedArray,
    row: &ShapedArray,
    col: &ShapedArray,
    v: &ShapedArray,
    spinfo: &CooInfo,
    transpose: bool,
) -> Result<ShapedArray> {
    check_triplet(NAME, data, row, col)?;
    if data.dtype != v.dtype {
        return Err(CooError::DtypeMismatch {
            op: NAME,
            expected: data.dtype,
            found: v.dtype,
        });
    }
    if v.ndim() != 1 {
        return Err(CooError::Rank {
            op: NAME,
            ndim: v.ndim(),
        });
    }
    let (n_in, n_out) = dims(spinfo, transpose);
    if v.shape[0] != n_in {
        return Err(CooError::ShapeMismatch {
            op: NAME,
            detail: format!(
                "vector has length {}, expected {n_in} for shape {:?} (transpose={transpose})",
                v.shape[0], spinfo.shape
            ),
        });
    }
    Ok(ShapedArray::vector(n_out, data.dtype))
}

/// `y[row[i]] += data[i] * v[col[i]]`, with the index roles swapped when `transpose` is set.
pub fn reference<T: Scalar, I: IndexType>(
    data: &[T],
    pattern: Pattern<'_, I>,
    v: &[T],
    spinfo: &CooInfo,
    transpose: bool,
) -> Vec<T> {
    let pattern = pattern.oriented(transpose);
    let (_, n_out) = dims(spinfo, transpose);
    let mut y = vec![T::zero(); n_out];
    for ((&d, &r), &c) in data.iter().zip(pattern.row).zip(pattern.col) {
        y[r.index()] += d * v[c.index()];
    }
    y
}

/// Bilinear: the two partial tangents are summed.
#[allow(clippy::too_many_arguments)]
pub fn jvp<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    data: &[T],
    data_dot: Tangent<&[T]>,
    pattern: Pattern<'_, I>,
    v: &[T],
    v_dot: Tangent<&[T]>,
    spinfo: &CooInfo,
    transpose: bool,
) -> Result<Tangent<Vec<T>>> {
    let from_data = match data_dot {
        Tangent::Zero => Tangent::Zero,
        Tangent::Value(d) => Tangent::Value(ctx.matvec_raw(d, pattern, v, spinfo, transpose)?),
    };
    let from_v = match v_dot {
        Tangent::Zero => Tangent::Zero,
        Tangent::Value(vd) => Tangent::Value(ctx.matvec_raw(data, pattern, vd, spinfo, transpose)?),
    };
    Ok(add_tangents(from_data, from_v, |a, b| {
        a.into_iter().zip(b).map(|(x, y)| x + y).collect()
    }))
}

/// Cotangent of whichever of `data` and `v` is linear.
///
/// For `v` this is the transposed product applied to `ct`. For `data` it is
/// `ct[row[i]] * v[col[i]]`, which equals gathering `outer(ct, v)` at the pattern without
/// forming the outer product.
pub fn transpose<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    ct: &[T],
    data: Primal<&[T]>,
    pattern: Pattern<'_, I>,
    v: Primal<&[T]>,
    spinfo: &CooInfo,
    transpose: bool,
) -> Result<Cotangent<T, Vec<T>>> {
    match (data, v) {
        (Primal::Known(data), Primal::Linear) => ctx
            .matvec_raw(data, pattern, ct, spinfo, !transpose)
            .map(Cotangent::Operand),
        (Primal::Linear, Primal::Known(v)) => {
            let (n_in, n_out) = dims(spinfo, transpose);
            if ct.len() != n_out || v.len() != n_in {
                return Err(CooError::ShapeMismatch {
                    op: NAME,
                    detail: format!(
                        "cotangent length {} and vector length {} do not match shape {:?} (transpose={transpose})",
                        ct.len(),
                        v.len(),
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
                .map(|(&r, &c)| ct[r.index()] * v[c.index()])
                .collect();
            Ok(Cotangent::Data(data_ct))
        }
        _ => Err(CooError::NotLinear(NAME)),
    }
}

pub type MatvecDef<T, I> = PrimitiveDef<
    fn(&ShapedArray, &ShapedArray, &ShapedArray, &ShapedArray, &CooInfo, bool) -> Result<ShapedArray>,
    fn(&[T], Pattern<'_, I>, &[T], &CooInfo, bool) -> Vec<T>,
    fn(
        &SparseContext,
        &[T],
        Tangent<&[T]>,
        Pattern<'_, I>,
        &[T],
        Tangent<&[T]>,
        &CooInfo,
        bool,
    ) -> Result<Tangent<Vec<T>>>,
    fn(
        &SparseContext,
        &[T],
        Primal<&[T]>,
        Pattern<'_, I>,
        Primal<&[T]>,
        &CooInfo,
        bool,
    ) -> Result<Cotangent<T, Vec<T>>>,
>;

pub fn def<T: Scalar, I: IndexType>() -> MatvecDef<T, I> {
    PrimitiveDef {
        kind: PrimitiveKind::CooMatvec,
        abstract_eval,
        reference: reference::<T, I>,
        jvp: jvp::<T, I>,
        transpose: transpose::<T, I>,
    }
}
