//! Element types, dtype tags and abstract values.

pub mod aval;
pub mod traits;

pub use aval::ShapedArray;
pub use traits::{DType, DTypeSet, IndexType, Scalar};
