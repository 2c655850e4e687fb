use thiserror::Error;

use crate::core::traits::DType;

// Unified error type for spcoo

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CooError {
    #[error("shape mismatch in {op}: {detail}")]
    ShapeMismatch { op: &'static str, detail: String },
    #[error("dtype mismatch in {op}: expected {expected}, found {found}")]
    DtypeMismatch {
        op: &'static str,
        expected: DType,
        found: DType,
    },
    #[error("{op} does not support operands with ndim={ndim}")]
    Rank { op: &'static str, ndim: usize },
    #[error("data, row and col must have equal length (data={data}, row={row}, col={col})")]
    LengthMismatch { data: usize, row: usize, col: usize },
    #[error("entry {index} at ({row}, {col}) is out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        index: usize,
        row: i128,
        col: i128,
        shape: (usize, usize),
    },
    #[error("{op} cannot allocate buffers for nse={nse}")]
    Allocation { op: &'static str, nse: usize },
    #[error("index value {0} does not fit the index dtype")]
    IndexOverflow(usize),
    #[error("cannot differentiate {primitive} with respect to sparse index argument `{arg}`")]
    NonDifferentiable {
        primitive: &'static str,
        arg: &'static str,
    },
    #[error("{0} transpose requires exactly one linear value input")]
    NotLinear(&'static str),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("a lowering for {primitive} on platform {platform} is already registered")]
    DuplicateLowering {
        primitive: &'static str,
        platform: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, CooError>;
