//! The four COO primitives.
//!
//! Each primitive module supplies the same four pieces:
//!
//! - `abstract_eval`: shape/dtype inference over [`ShapedArray`](crate::core::ShapedArray)s,
//! - `reference`: the scatter/gather baseline kernel,
//! - `jvp`: the forward-mode rule,
//! - `transpose`: the reverse-mode rule,
//!
//! and a `def()` constructor bundling them into a [`PrimitiveDef`] for a differentiation
//! engine to consult. The rules re-enter the primitive family through a
//! [`SparseContext`](crate::context::SparseContext), so derivative products are dispatched
//! exactly like primal ones.

use std::fmt;

use crate::error::{CooError, Result};

pub mod ad;
pub mod fromdense;
pub mod matmat;
pub mod matvec;
pub mod todense;

pub use ad::{Cotangent, Primal, Tangent};

/// Identifies a primitive in the dispatch registry and in diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    CooTodense,
    CooFromdense,
    CooMatvec,
    CooMatmat,
}

/// Whether an argument carries continuous values or sparsity-pattern indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgRole {
    Value,
    Index,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::CooTodense,
        PrimitiveKind::CooFromdense,
        PrimitiveKind::CooMatvec,
        PrimitiveKind::CooMatmat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::CooTodense => "coo_todense",
            PrimitiveKind::CooFromdense => "coo_fromdense",
            PrimitiveKind::CooMatvec => "coo_matvec",
            PrimitiveKind::CooMatmat => "coo_matmat",
        }
    }

    /// Positional argument names.
    pub fn arg_names(self) -> &'static [&'static str] {
        match self {
            PrimitiveKind::CooTodense => &["data", "row", "col"],
            PrimitiveKind::CooFromdense => &["mat"],
            PrimitiveKind::CooMatvec => &["data", "row", "col", "v"],
            PrimitiveKind::CooMatmat => &["data", "row", "col", "B"],
        }
    }

    pub fn arg_roles(self) -> &'static [ArgRole] {
        use ArgRole::{Index, Value};
        match self {
            PrimitiveKind::CooTodense => &[Value, Index, Index],
            PrimitiveKind::CooFromdense => &[Value],
            PrimitiveKind::CooMatvec | PrimitiveKind::CooMatmat => &[Value, Index, Index, Value],
        }
    }

    /// Rejects a request to differentiate with respect to any index argument.
    pub fn check_wrt(self, wrt: &[usize]) -> Result<()> {
        let roles = self.arg_roles();
        for &pos in wrt {
            match roles.get(pos) {
                Some(ArgRole::Value) => {}
                Some(ArgRole::Index) => {
                    return Err(CooError::NonDifferentiable {
                        primitive: self.name(),
                        arg: self.arg_names()[pos],
                    });
                }
                None => {
                    return Err(CooError::ShapeMismatch {
                        op: self.name(),
                        detail: format!(
                            "argument position {pos} out of range for {} arguments",
                            roles.len()
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four typed function slots of one primitive.
#[derive(Copy, Clone)]
pub struct PrimitiveDef<Eval, Impl, Jvp, Transpose> {
    pub kind: PrimitiveKind,
    pub abstract_eval: Eval,
    pub reference: Impl,
    pub jvp: Jvp,
    pub transpose: Transpose,
}

impl<Eval, Impl, Jvp, Transpose> fmt::Debug for PrimitiveDef<Eval, Impl, Jvp, Transpose> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveDef").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Checks the `(data, row, col)` avals: equal-length 1-D arrays with one integer index dtype.
pub(crate) fn check_triplet(
    op: &'static str,
    data: &crate::core::ShapedArray,
    row: &crate::core::ShapedArray,
    col: &crate::core::ShapedArray,
) -> Result<()> {
    if data.ndim() != 1 || row.ndim() != 1 || col.ndim() != 1 {
        return Err(CooError::ShapeMismatch {
            op,
            detail: format!(
                "data, row and col must be 1-D, got {:?}, {:?}, {:?}",
                data.shape, row.shape, col.shape
            ),
        });
    }
    if data.shape != row.shape || data.shape != col.shape {
        return Err(CooError::ShapeMismatch {
            op,
            detail: format!(
                "data, row and col must have equal length, got {}, {}, {}",
                data.shape[0], row.shape[0], col.shape[0]
            ),
        });
    }
    if !row.dtype.is_integer() {
        return Err(CooError::DtypeMismatch {
            op,
            expected: crate::core::DType::I32,
            found: row.dtype,
        });
    }
    if row.dtype != col.dtype {
        return Err(CooError::DtypeMismatch {
            op,
            expected: row.dtype,
            found: col.dtype,
        });
    }
    Ok(())
}
