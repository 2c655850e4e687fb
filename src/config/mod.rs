//! Runtime configuration.

pub mod options;

pub use options::DispatchOptions;
