//! spcoo: coordinate-format (COO) sparse matrix primitives over Faer
//!
//! This crate provides the four COO primitives `todense`, `fromdense`, `matvec` and `matmat`,
//! each with shape/dtype inference, a reference kernel, forward- and reverse-mode
//! differentiation rules, and a dispatcher that lowers calls to row-segmented (optionally
//! rayon-parallel) kernels when the layout hints allow it.

pub mod config;
pub mod context;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod matrix;
pub mod ops;
pub mod primitive;

// Re-exports for convenience
pub use crate::config::DispatchOptions;
pub use crate::context::SparseContext;
pub use crate::core::{DType, DTypeSet, IndexType, Scalar, ShapedArray};
pub use crate::dispatch::{
    Diagnostic, DiagnosticSink, DispatchRegistry, FallbackReason, LogSink, Platform, RecordingSink,
};
pub use crate::error::{CooError, Result};
pub use crate::matrix::{CooBuffers, CooInfo, CooMatrix, Operand, Pattern, Product};
pub use crate::ops::{coo_fromdense, coo_matmat, coo_matvec, coo_todense};
pub use crate::primitive::{Cotangent, Primal, PrimitiveKind, Tangent};
