//! CPU implementation of filter algorithms.

pub mod filter_apply;
pub mod iir_design;
