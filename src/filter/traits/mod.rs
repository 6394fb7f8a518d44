//! Filter algorithm traits.

pub mod filter_apply;
pub mod iir_design;

pub use filter_apply::{FilterApplicationAlgorithms, LfilterResult, PadType};
pub use iir_design::{IirDesignAlgorithms, IirDesignResult};
