//! Batched IIR filter design and zero-phase filtering.
//!
//! # Filter Representations
//!
//! - [`TransferFunction`]: Numerator/denominator polynomials (b, a), one set
//!   or one set per batch element
//! - [`ZpkFilter`]: Zeros, poles, and gain
//! - [`AnalogPrototype`]: Analog zeros, poles, and gain
//!
//! # IIR Filter Design
//!
//! Classic IIR filter design using the bilinear transform with pre-warping,
//! via [`IirDesignAlgorithms`]:
//! - Butterworth (maximally flat)
//! - Chebyshev Type I (passband ripple)
//! - Chebyshev Type II (stopband ripple)
//! - Elliptic (sharpest transition)
//! - Bessel-Thomson (maximally flat group delay)
//!
//! Cutoffs, ripple, and stopband attenuation may each be a scalar or a
//! per-example sequence ([`DesignParam`]); a request with sequences of length
//! `B` designs `B` filters at once.
//!
//! # Filter Application
//!
//! [`FilterApplicationAlgorithms::filtfilt`] runs forward-backward filtering
//! over `[samples]` or `[batch, samples]` signals. [`IirFilter`] bundles a
//! design with its application.
//!
//! # Example
//!
//! ```
//! use batch_iir::filter::{DesignParam, FilterApplicationAlgorithms, FilterOutput, FilterSpec, IirDesignAlgorithms};
//! use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
//! use numr::tensor::Tensor;
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! // One 4th-order Butterworth highpass per row, each with its own cutoff
//! let spec = FilterSpec::<DesignParam>::highpass(4, vec![20.0, 40.0]).digital(512.0);
//! let tf = client.design(&spec, FilterOutput::Ba)?.into_ba().unwrap();
//! assert_eq!(tf.b.shape(), &[2, 5]);
//!
//! let x = Tensor::<CpuRuntime>::from_slice(&vec![1.0f64; 2 * 200], &[2, 200], &device);
//! let y = client.filtfilt(&tf, &x, None, None)?;
//! assert_eq!(y.shape(), &[2, 200]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod impl_generic;
pub mod spec;
pub mod traits;
pub mod types;

mod cpu;
mod iir_filter;

// Re-export types
pub use iir_filter::IirFilter;
pub use spec::{Cutoff, DesignParam, Domain, FilterFamily, FilterSpec};
pub use types::{
    AnalogPrototype, BandType, BesselNorm, FilterKind, FilterOutput, TransferFunction, ZpkFilter,
};

// Re-export traits
pub use traits::filter_apply::{FilterApplicationAlgorithms, LfilterResult, PadType};
pub use traits::iir_design::{IirDesignAlgorithms, IirDesignResult};
