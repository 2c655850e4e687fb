//! `coo_todense`: scatter-add the specified entries into a dense matrix.

use faer::{Mat, MatRef};

use crate::context::SparseContext;
use crate::core::{IndexType, Scalar, ShapedArray};
use crate::error::{CooError, Result};
use crate::matrix::dense::{extract, zeros};
use crate::matrix::info::{CooInfo, Pattern};
use crate::primitive::ad::{Primal, Tangent};
use crate::primitive::{PrimitiveDef, PrimitiveKind, check_triplet};

const NAME: &str = "coo_todense";

pub fn abstract_eval(
    data: &ShapedArray,
    row: &ShapedArray,
    col: &ShapedArray,
    spinfo: &CooInfo,
) -> Result<ShapedArray> {
    check_triplet(NAME, data, row, col)?;
    Ok(ShapedArray::matrix(spinfo.nrows(), spinfo.ncols(), data.dtype))
}

/// Duplicate coordinates accumulate.
pub fn reference<T: Scalar, I: IndexType>(
    data: &[T],
    pattern: Pattern<'_, I>,
    spinfo: &CooInfo,
) -> Mat<T> {
    let mut out = zeros(spinfo.nrows(), spinfo.ncols());
    for ((&v, &r), &c) in data.iter().zip(pattern.row).zip(pattern.col) {
        out[(r.index(), c.index())] += v;
    }
    out
}

/// Linear in `data`: the tangent is the densified tangent values.
pub fn jvp<T: Scalar, I: IndexType>(
    ctx: &SparseContext,
    data_dot: Tangent<&[T]>,
    pattern: Pattern<'_, I>,
    spinfo: &CooInfo,
) -> Result<Tangent<Mat<T>>> {
    match data_dot {
        Tangent::Zero => Ok(Tangent::Zero),
        Tangent::Value(d) => ctx.todense_raw(d, pattern, spinfo).map(Tangent::Value),
    }
}

/// Gathers the dense cotangent back at the pattern coordinates.
pub fn transpose<T: Scalar, I: IndexType>(
    ct: MatRef<'_, T>,
    data: Primal<&[T]>,
    pattern: Pattern<'_, I>,
    spinfo: &CooInfo,
) -> Result<Vec<T>> {
    if !data.is_linear() {
        return Err(CooError::NotLinear(NAME));
    }
    if (ct.nrows(), ct.ncols()) != spinfo.shape {
        return Err(CooError::ShapeMismatch {
            op: NAME,
            detail: format!(
                "cotangent has shape {:?}, expected {:?}",
                (ct.nrows(), ct.ncols()),
                spinfo.shape
            ),
        });
    }
    pattern.validate(pattern.nse(), spinfo.shape)?;
    Ok(extract(pattern, ct))
}

pub type TodenseDef<T, I> = PrimitiveDef<
    fn(&ShapedArray, &ShapedArray, &ShapedArray, &CooInfo) -> Result<ShapedArray>,
    fn(&[T], Pattern<'_, I>, &CooInfo) -> Mat<T>,
    fn(&SparseContext, Tangent<&[T]>, Pattern<'_, I>, &CooInfo) -> Result<Tangent<Mat<T>>>,
    fn(MatRef<'_, T>, Primal<&[T]>, Pattern<'_, I>, &CooInfo) -> Result<Vec<T>>,
>;

pub fn def<T: Scalar, I: IndexType>() -> TodenseDef<T, I> {
    PrimitiveDef {
        kind: PrimitiveKind::CooTodense,
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
    use crate::matrix::dense::to_rows;

    #[test]
    fn duplicates_accumulate() {
        let data = [1.0, 2.0, 5.0];
        let row = [0i32, 1, 0];
        let col = [1i32, 0, 1];
        let dense = reference(&data, Pattern::new(&row, &col), &CooInfo::new((2, 2)));
        assert_eq!(to_rows(dense.as_ref()), vec![vec![0.0, 6.0], vec![2.0, 0.0]]);
    }

    #[test]
    fn abstract_eval_rejects_mixed_index_dtypes() {
        let data = ShapedArray::vector(3, DType::F32);
        let row = ShapedArray::vector(3, DType::I32);
        let col = ShapedArray::vector(3, DType::I64);
        let err = abstract_eval(&data, &row, &col, &CooInfo::new((4, 4))).unwrap_err();
        assert!(matches!(err, CooError::DtypeMismatch { .. }));

        let out = abstract_eval(&data, &row, &row, &CooInfo::new((4, 5))).unwrap();
        assert_eq!(out, ShapedArray::matrix(4, 5, DType::F32));
    }

    #[test]
    fn transpose_requires_linear_data() {
        let row = [0i32];
        let col = [0i32];
        let ct = zeros::<f64>(1, 1);
        let data = [1.0];
        let err = transpose(
            ct.as_ref(),
            Primal::Known(&data[..]),
            Pattern::new(&row, &col),
            &CooInfo::new((1, 1)),
        )
        .unwrap_err();
        assert_eq!(err, CooError::NotLinear("coo_todense"));
    }
}
