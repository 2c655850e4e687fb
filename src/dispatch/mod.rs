//! Backend dispatch for the COO primitives.
//!
//! For every `(primitive, platform)` pair at most one [`Lowering`] is registered in a
//! [`DispatchRegistry`]. The reference kernels are always registered as the
//! platform-independent fallback. An accelerated lowering is only used when
//!
//! 1. the value dtype is in its supported set, and
//! 2. (for todense/matvec/matmat) the matrix is hinted as sorted by rows or by columns.
//!
//! A column-sorted matrix is handed to the row-sorted kernels as its transpose: `row` and
//! `col` are swapped, the shape is reversed and the `transpose` flag flipped. When neither
//! condition can be met the reference kernel runs instead and a [`Diagnostic`] is reported.
//!
//! The eligibility checks ([`dtype_supported`], [`layout_orientation`]) and the decision
//! itself ([`plan`]) are pure functions; the [`SparseContext`](crate::context::SparseContext)
//! executes the resulting [`LoweringPlan`].

use std::fmt;

use crate::core::{DType, DTypeSet};
use crate::matrix::info::CooInfo;

pub mod diagnostic;
pub mod kernels;
pub mod registry;
pub mod segmented;

pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, FallbackReason, LogSink, RecordingSink};
pub use kernels::{CooKernels, ReferenceKernels};
pub use registry::{DispatchRegistry, RegistryBuilder};
pub use segmented::SegmentedKernels;

/// Backend identifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Scatter/gather reference kernels; always available.
    Reference,
    /// Sequential row-segmented kernels.
    Segmented,
    /// Row-segmented kernels parallelised over rows with rayon.
    Threaded,
}

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::Reference => "reference",
            Platform::Segmented => "segmented",
            Platform::Threaded => "threaded",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kernel implementation behind an accelerated lowering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KernelFamily {
    Segmented,
    Threaded,
}

/// What a platform registers for one primitive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lowering {
    Reference,
    Accelerated(AcceleratedLowering),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AcceleratedLowering {
    pub family: KernelFamily,
    /// Value dtypes the kernels accept.
    pub dtypes: DTypeSet,
    /// Whether the kernels need row-sorted (or, via transposition, column-sorted) input.
    pub requires_sorted: bool,
}

/// How a sorted matrix is presented to the row-sorted kernels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// `rows_sorted`: pass through unchanged.
    Rows,
    /// Only `cols_sorted`: swap `row`/`col`, reverse the shape, flip `transpose`.
    Swapped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoweringPlan {
    Reference,
    Accelerated {
        family: KernelFamily,
        orientation: Orientation,
    },
    Fallback(FallbackReason),
}

pub fn dtype_supported(dtypes: DTypeSet, dtype: DType) -> bool {
    dtypes.contains_dtype(dtype)
}

pub fn layout_orientation(spinfo: &CooInfo) -> Option<Orientation> {
    if spinfo.rows_sorted {
        Some(Orientation::Rows)
    } else if spinfo.cols_sorted {
        Some(Orientation::Swapped)
    } else {
        None
    }
}

/// Decides how a call is lowered. `spinfo` is `None` for primitives without a sparse input.
pub fn plan(lowering: &Lowering, dtype: DType, spinfo: Option<&CooInfo>) -> LoweringPlan {
    let acc = match lowering {
        Lowering::Reference => return LoweringPlan::Reference,
        Lowering::Accelerated(acc) => acc,
    };
    if !dtype_supported(acc.dtypes, dtype) {
        return LoweringPlan::Fallback(FallbackReason::UnsupportedDtype(dtype));
    }
    let orientation = if acc.requires_sorted {
        match spinfo.and_then(layout_orientation) {
            Some(o) => o,
            None => return LoweringPlan::Fallback(FallbackReason::UnsortedLayout),
        }
    } else {
        Orientation::Rows
    };
    LoweringPlan::Accelerated {
        family: acc.family,
        orientation,
    }
}
