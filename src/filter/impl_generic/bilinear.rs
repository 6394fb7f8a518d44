//! Bilinear transform implementation.
//!
//! Converts analog (continuous-time) filters to digital (discrete-time) filters
//! using the bilinear transformation.

use super::zpk::{prod_map, Zpk};
use crate::error::{FilterError, FilterResult};
use crate::filter::types::{AnalogPrototype, ZpkFilter};
use num_complex::Complex64;
use numr::runtime::{Runtime, RuntimeClient};
use std::f64::consts::PI;

/// Apply bilinear transform to convert analog filter to digital.
///
/// # Algorithm
///
/// The bilinear transform maps the s-plane to the z-plane via:
/// ```text
/// s = (2*fs) * (z - 1) / (z + 1)
/// ```
///
/// so each analog root `r` maps to `(2*fs + r) / (2*fs - r)`. Zeros at
/// infinity land on `z = -1`, and the gain becomes
/// ```text
/// k_d = k_a * Re(prod(2*fs - z_i) / prod(2*fs - p_i))
/// ```
pub fn bilinear_zpk(zpk: &Zpk, fs: f64) -> FilterResult<Zpk> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(FilterError::invalid(
            "fs",
            format!("sample rate must be positive and finite, got {}", fs),
        ));
    }
    let degree = zpk.degree()?;
    let fs2 = 2.0 * fs;
    let map = |&r: &Complex64| (fs2 + r) / (fs2 - r);

    let mut zeros: Vec<Complex64> = zpk.zeros.iter().map(map).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
    let poles = zpk.poles.iter().map(map).collect();

    let gain = zpk.gain
        * (prod_map(&zpk.zeros, |z| fs2 - z) / prod_map(&zpk.poles, |p| fs2 - p)).re;

    Ok(Zpk::new(zeros, poles, gain))
}

/// Pre-warp a digital critical frequency for the bilinear transform.
///
/// Returns the analog frequency (rad/s) that the bilinear transform at sample
/// rate `fs` maps onto `freq` (same units as `fs`).
pub fn prewarp(freq: f64, fs: f64) -> f64 {
    2.0 * fs * (PI * freq / fs).tan()
}

/// Bilinear transform of a tensor analog filter (generic over Runtime).
pub fn bilinear_zpk_impl<R, C>(
    client: &C,
    analog: &AnalogPrototype<R>,
    fs: f64,
) -> FilterResult<ZpkFilter<R>>
where
    R: Runtime,
    C: RuntimeClient<R>,
{
    let zpk = Zpk::from_analog(analog)?;
    Ok(bilinear_zpk(&zpk, fs)?.to_digital(client.device()))
}
