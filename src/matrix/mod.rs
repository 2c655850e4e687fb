//! The COO container, its metadata and dense-array helpers.

pub mod coo;
pub mod dense;
pub mod info;

pub use coo::{CooMatrix, Operand, Product};
pub use info::{CooBuffers, CooInfo, Pattern};
