//! Generic implementations of filter design algorithms.
//!
//! Design math runs on host-side [`Zpk`] values with complex roots; results
//! are converted to runtime tensors only at the API boundary, so every
//! backend shares one numerical path.
//!
//! Filter application is inherently sequential per signal and is implemented
//! CPU-only in the cpu/ directory.

mod bessel;
mod bilinear;
mod conversions;
mod elliptic;
mod freq_transform;
mod freqz;
mod helpers;
mod iir_wrapper;
mod prototypes;
mod zpk;

// Re-export for backend implementations
pub use bessel::besselap;
pub use bilinear::{bilinear_zpk, bilinear_zpk_impl, prewarp};
pub use conversions::{check_stability, zpk2tf, zpk2tf_impl};
pub use elliptic::{ellipap, ellipj, ellipk, ellipkm1};
pub use freq_transform::{lp2bp_zpk, lp2bs_zpk, lp2hp_zpk, lp2lp_zpk, to_band, to_band_impl};
pub use freqz::freqz;
pub use helpers::{f64_to_tensor, tensor_rows, tensor_to_f64};
pub use iir_wrapper::{design_impl, design_one, iirfilter_impl};
pub use prototypes::{analog_prototype, analog_prototype_impl, buttap, cheb1ap, cheb2ap};
pub use zpk::Zpk;
