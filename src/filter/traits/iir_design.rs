//! IIR filter design algorithm traits.
//!
//! Provides algorithms for designing IIR digital filters, one coefficient set
//! per batch element when design parameters are given per example.

// Allow many arguments for filter design functions that match scipy's signature
#![allow(clippy::too_many_arguments)]

use crate::error::FilterResult;
use crate::filter::spec::{DesignParam, FilterFamily, FilterSpec};
use crate::filter::types::{
    AnalogPrototype, BandType, FilterKind, FilterOutput, TransferFunction, ZpkFilter,
};
use numr::runtime::Runtime;

/// IIR filter design algorithms.
///
/// All backends implementing IIR design MUST implement this trait using the
/// EXACT SAME ALGORITHMS to ensure numerical parity.
///
/// # Design Pipeline
///
/// 1. Design analog lowpass prototype (cutoff = 1 rad/s)
/// 2. Transform to target band type and cutoff(s)
/// 3. Apply bilinear transform to get a digital filter (digital designs only)
/// 4. Convert to the requested output format
pub trait IirDesignAlgorithms<R: Runtime> {
    /// Analog lowpass prototype of `family` with `order` poles.
    fn analog_prototype(
        &self,
        family: &FilterFamily<f64>,
        order: usize,
    ) -> FilterResult<AnalogPrototype<R>>;

    /// Transform a lowpass prototype to `band`.
    ///
    /// # Arguments
    ///
    /// * `proto` - Lowpass prototype with cutoff 1 rad/s
    /// * `band` - Target band type
    /// * `edges` - Band edges in rad/s: one for lowpass/highpass, two for
    ///   bandpass/bandstop
    ///
    /// Applies the s-domain substitution:
    /// - LP→LP: s → s/ω₀
    /// - LP→HP: s → ω₀/s
    /// - LP→BP: s → (s² + ω₀²)/(B·s)
    /// - LP→BS: s → B·s/(s² + ω₀²)
    fn to_band(
        &self,
        proto: &AnalogPrototype<R>,
        band: BandType,
        edges: &[f64],
    ) -> FilterResult<AnalogPrototype<R>>;

    /// Apply bilinear transform to convert analog filter to digital.
    ///
    /// ```text
    /// s = 2*fs * (z - 1) / (z + 1)
    /// ```
    fn bilinear_zpk(&self, analog: &AnalogPrototype<R>, fs: f64) -> FilterResult<ZpkFilter<R>>;

    /// Expand zeros, poles, and gain into transfer function coefficients,
    /// normalized so that `a[0] = 1`.
    fn zpk2tf(&self, zpk: &ZpkFilter<R>) -> FilterResult<TransferFunction<R>>;

    /// Design the filter(s) described by `spec`.
    ///
    /// Every per-example parameter sequence must have the same length `B`;
    /// the result then holds `B` coefficient sets (`[B, n]` tensors for
    /// [`FilterOutput::Ba`]). When every parameter is a scalar, a single set
    /// of shape `[n]` is returned.
    fn design(
        &self,
        spec: &FilterSpec<DesignParam>,
        output: FilterOutput,
    ) -> FilterResult<IirDesignResult<R>>;

    /// Design an IIR filter from SciPy-style loose arguments.
    ///
    /// # Arguments
    ///
    /// * `order` - Filter order (number of prototype poles)
    /// * `cutoff` - Critical frequencies, each a scalar or per-example sequence
    ///   - For lowpass/highpass: single frequency
    ///   - For bandpass/bandstop: [low, high] frequencies
    /// * `kind` - IIR family
    /// * `band` - Band type
    /// * `analog` - Design an analog filter (cutoffs in rad/s)
    /// * `fs` - Sample rate of a digital filter; `None` means cutoffs are
    ///   normalized to Nyquist
    /// * `rp` - Maximum ripple in passband (dB). Required for Chebyshev1 and Elliptic.
    /// * `rs` - Minimum attenuation in stopband (dB). Required for Chebyshev2 and Elliptic.
    /// * `output` - Output format
    ///
    /// # Example
    ///
    /// ```
    /// # use numr::runtime::cpu::{CpuClient, CpuDevice};
    /// use batch_iir::filter::{BandType, DesignParam, FilterKind, FilterOutput, IirDesignAlgorithms};
    /// # let device = CpuDevice::new();
    /// # let client = CpuClient::new(device.clone());
    /// // Three 4th-order Chebyshev Type I lowpass filters with different ripple
    /// let result = client.iirfilter(
    ///     4,
    ///     &[DesignParam::Scalar(100.0)],
    ///     FilterKind::Chebyshev1,
    ///     BandType::Lowpass,
    ///     false,
    ///     Some(1024.0),
    ///     Some(DesignParam::PerExample(vec![0.1, 0.5, 1.0])),
    ///     None,
    ///     FilterOutput::Ba,
    /// )?;
    /// let tf = result.as_ba().unwrap();
    /// assert_eq!(tf.b.shape(), &[3, 5]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn iirfilter(
        &self,
        order: usize,
        cutoff: &[DesignParam],
        kind: FilterKind,
        band: BandType,
        analog: bool,
        fs: Option<f64>,
        rp: Option<DesignParam>,
        rs: Option<DesignParam>,
        output: FilterOutput,
    ) -> FilterResult<IirDesignResult<R>>;
}

/// Result from IIR filter design functions.
///
/// Contains the filter in the requested output format.
#[derive(Debug, Clone)]
pub enum IirDesignResult<R: Runtime> {
    /// Transfer function coefficients (b, a), shape `[n]` or `[batch, n]`.
    Ba(TransferFunction<R>),
    /// Zeros, poles, and gain, one entry per batch element.
    Zpk(Vec<ZpkFilter<R>>),
}

impl<R: Runtime> IirDesignResult<R> {
    /// Get as transfer function, if that's the format.
    pub fn as_ba(&self) -> Option<&TransferFunction<R>> {
        match self {
            IirDesignResult::Ba(tf) => Some(tf),
            _ => None,
        }
    }

    /// Get as ZPK, if that's the format.
    pub fn as_zpk(&self) -> Option<&[ZpkFilter<R>]> {
        match self {
            IirDesignResult::Zpk(zpk) => Some(zpk),
            _ => None,
        }
    }

    /// Take the transfer function, if that's the format.
    pub fn into_ba(self) -> Option<TransferFunction<R>> {
        match self {
            IirDesignResult::Ba(tf) => Some(tf),
            _ => None,
        }
    }
}
