//! Core element traits for spcoo.
//!
//! Values stored in a COO matrix implement [`Scalar`]; row/column indices implement
//! [`IndexType`]. Both carry a runtime [`DType`] tag so abstract evaluation and the
//! dispatcher can reason about element types without knowing the generic parameters.

use std::fmt;
use std::ops::{Add, AddAssign, Mul};

use bitflags::bitflags;
use num_complex::{Complex32, Complex64};
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

use crate::error::{CooError, Result};

/// Runtime element type tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    /// Complex with two `f32` parts.
    C64,
    /// Complex with two `f64` parts.
    C128,
    I32,
    I64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::C64 => "complex64",
            DType::C128 => "complex128",
            DType::I32 => "int32",
            DType::I64 => "int64",
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, DType::C64 | DType::C128)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, DType::I32 | DType::I64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of dtypes, used by lowerings to declare what they accept.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct DTypeSet: u32 {
        const F32      = 0b0000_0001;
        const F64      = 0b0000_0010;
        const C64      = 0b0000_0100;
        const C128     = 0b0000_1000;
        const I32      = 0b0001_0000;
        const I64      = 0b0010_0000;
        const FLOATING = Self::F32.bits() | Self::F64.bits();
        const COMPLEX  = Self::C64.bits() | Self::C128.bits();
        const INEXACT  = Self::FLOATING.bits() | Self::COMPLEX.bits();
        const INTEGER  = Self::I32.bits() | Self::I64.bits();
    }
}

impl DTypeSet {
    pub fn contains_dtype(self, dtype: DType) -> bool {
        self.contains(DTypeSet::from(dtype))
    }
}

impl From<DType> for DTypeSet {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::F32 => DTypeSet::F32,
            DType::F64 => DTypeSet::F64,
            DType::C64 => DTypeSet::C64,
            DType::C128 => DTypeSet::C128,
            DType::I32 => DTypeSet::I32,
            DType::I64 => DTypeSet::I64,
        }
    }
}

/// Element type of the stored values and of the dense operands.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + fmt::Debug
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + 'static
{
    const DTYPE: DType;
}

impl Scalar for f32 {
    const DTYPE: DType = DType::F32;
}
impl Scalar for f64 {
    const DTYPE: DType = DType::F64;
}
impl Scalar for Complex32 {
    const DTYPE: DType = DType::C64;
}
impl Scalar for Complex64 {
    const DTYPE: DType = DType::C128;
}
impl Scalar for i32 {
    const DTYPE: DType = DType::I32;
}
impl Scalar for i64 {
    const DTYPE: DType = DType::I64;
}

/// Integer type used for the `row` and `col` arrays.
pub trait IndexType:
    Copy + Send + Sync + fmt::Debug + Ord + ToPrimitive + FromPrimitive + 'static
{
    const DTYPE: DType;

    /// Converts to a position. Only meaningful for indices already checked against a shape.
    #[inline]
    fn index(self) -> usize {
        self.to_usize().unwrap_or(usize::MAX)
    }

    /// Checked conversion from a position.
    #[inline]
    fn from_index(i: usize) -> Result<Self> {
        Self::from_usize(i).ok_or(CooError::IndexOverflow(i))
    }
}

impl IndexType for i32 {
    const DTYPE: DType = DType::I32;
}
impl IndexType for i64 {
    const DTYPE: DType = DType::I64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inexact_set_excludes_integers() {
        assert!(DTypeSet::INEXACT.contains_dtype(DType::F32));
        assert!(DTypeSet::INEXACT.contains_dtype(DType::C128));
        assert!(!DTypeSet::INEXACT.contains_dtype(DType::I32));
        assert!(DTypeSet::INTEGER.contains_dtype(DType::I64));
    }

    #[test]
    fn index_conversion_is_checked() {
        assert_eq!(i32::from_index(7).unwrap(), 7);
        assert_eq!(
            i32::from_index(usize::MAX),
            Err(CooError::IndexOverflow(usize::MAX))
        );
        assert_eq!((-1i32).index(), usize::MAX);
        assert_eq!(5i64.index(), 5);
    }
}
