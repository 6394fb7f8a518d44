//! Filter application traits.
//!
//! Provides algorithms for applying digital filters to batches of signals.

use crate::error::FilterResult;
use crate::filter::types::TransferFunction;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Filter application algorithms.
///
/// Signals are `[samples]` or `[batch, samples]`. Coefficients are either one
/// set (`[n]`), applied to every row, or one set per row (`[batch, n]`).
/// Every row is filtered by the same sequential recursion in `f64`; the
/// output keeps the dtype of the input signal.
pub trait FilterApplicationAlgorithms<R: Runtime> {
    /// Apply an IIR filter using Direct Form II transposed.
    ///
    /// # Algorithm
    ///
    /// ```text
    /// y[n] = b[0]*x[n] + z[0]
    /// z[0] = b[1]*x[n] - a[1]*y[n] + z[1]
    /// z[1] = b[2]*x[n] - a[2]*y[n] + z[2]
    /// ...
    /// z[M-2] = b[M-1]*x[n] - a[M-1]*y[n]
    /// ```
    ///
    /// # Arguments
    ///
    /// * `b` - Numerator coefficients `[M]` or `[batch, M]`
    /// * `a` - Denominator coefficients `[N]` or `[batch, N]`
    /// * `x` - Input signal `[samples]` or `[batch, samples]`
    /// * `zi` - Initial state `[max(M,N)-1]` (shared) or `[batch, max(M,N)-1]`,
    ///   or None for zero state
    ///
    /// # Returns
    ///
    /// Filtered signal with same shape as input, and the final state.
    fn lfilter(
        &self,
        b: &Tensor<R>,
        a: &Tensor<R>,
        x: &Tensor<R>,
        zi: Option<&Tensor<R>>,
    ) -> FilterResult<LfilterResult<R>>;

    /// Steady-state initial conditions for a unit step.
    ///
    /// Solves `(I - A^T) zi = b[1:] - a[1:] * b[0]` where `A` is the
    /// companion matrix of `a`, so that filtering a constant `c` from state
    /// `c * zi` produces no transient.
    fn lfilter_zi(&self, b: &Tensor<R>, a: &Tensor<R>) -> FilterResult<Tensor<R>>;

    /// Zero-phase digital filtering (forward-backward filtering).
    ///
    /// # Algorithm
    ///
    /// 1. Extend each row by `padlen` samples at both ends
    /// 2. Filter forward from state `zi * ext[0]`
    /// 3. Reverse and filter again from state `zi * y[last]`
    /// 4. Reverse and strip the extension
    ///
    /// This squares the magnitude response and cancels phase distortion.
    ///
    /// # Arguments
    ///
    /// * `tf` - Transfer function coefficients
    /// * `x` - Input signal `[samples]` or `[batch, samples]`
    /// * `padtype` - Type of padding to use (default: Odd)
    /// * `padlen` - Number of samples to pad (default: 3 * max(len(a), len(b)))
    fn filtfilt(
        &self,
        tf: &TransferFunction<R>,
        x: &Tensor<R>,
        padtype: Option<PadType>,
        padlen: Option<usize>,
    ) -> FilterResult<Tensor<R>>;
}

/// Result from lfilter containing output and final state.
#[derive(Debug, Clone)]
pub struct LfilterResult<R: Runtime> {
    /// Filtered output signal.
    pub y: Tensor<R>,
    /// Final filter state (can be used as zi for next call).
    pub zf: Tensor<R>,
}

/// Padding type for filtfilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PadType {
    /// Odd extension (default): x[-n] = 2*x[0] - x[n]
    #[default]
    Odd,
    /// Even extension: x[-n] = x[n]
    Even,
    /// Constant extension: x[-n] = x[0]
    Constant,
    /// No padding.
    None,
}
