//! # batch-iir
//!
//! Batched IIR filter design and zero-phase filtering on `numr` tensors.
//!
//! Designs Butterworth, Chebyshev I/II, Elliptic, and Bessel filters the way
//! SciPy's `iirfilter` does (analog prototype, frequency transform, pre-warped
//! bilinear transform), optionally with a different cutoff, ripple, or
//! attenuation per batch element, and applies them with `filtfilt`-style
//! forward-backward filtering.
//!
//! See [`filter`] for the design and application APIs.

pub mod error;
pub mod filter;

pub use error::{FilterError, FilterResult};
