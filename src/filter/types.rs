//! Filter representation types.
//!
//! This module defines the filter representations produced by the design
//! pipeline and consumed by the zero-phase filter engine:
//!
//! - [`TransferFunction`]: Numerator/denominator polynomial coefficients (b, a)
//! - [`ZpkFilter`]: Zeros, poles, and gain of a digital filter
//! - [`AnalogPrototype`]: Zeros, poles, and gain of an analog filter
//!
//! # Coefficient Convention
//!
//! All polynomial coefficients use **descending power order** (highest power first):
//! - `H(z) = (b[0] + b[1]z^-1 + ... + b[M]z^-M) / (a[0] + a[1]z^-1 + ... + a[N]z^-N)`
//! - This matches SciPy's convention for filter functions.
//!
//! # Batched Coefficients
//!
//! A [`TransferFunction`] holds either one coefficient set (`b`, `a` of shape
//! `[n]`), which is broadcast to every signal in a batch, or one set per batch
//! element (shape `[batch, n]`), which is paired with signals row by row.

use crate::error::{FilterError, FilterResult};
use numr::runtime::Runtime;
use numr::tensor::Tensor;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transfer function filter representation.
///
/// Represents a digital filter as the ratio of two polynomials:
/// ```text
/// H(z) = B(z) / A(z) = (b[0] + b[1]z^-1 + ... + b[M]z^-M)
///                    / (a[0] + a[1]z^-1 + ... + a[N]z^-N)
/// ```
///
/// # Normalization
///
/// Designed filters are normalized so that `a[0] = 1`.
#[derive(Debug, Clone)]
pub struct TransferFunction<R: Runtime> {
    /// Numerator coefficients `[M+1]` or `[batch, M+1]` in descending power order.
    pub b: Tensor<R>,
    /// Denominator coefficients `[N+1]` or `[batch, N+1]` in descending power order.
    pub a: Tensor<R>,
}

impl<R: Runtime> TransferFunction<R> {
    /// Create a new transfer function from numerator and denominator coefficients.
    ///
    /// # Arguments
    ///
    /// * `b` - Numerator coefficients `[M+1]` or `[batch, M+1]`
    /// * `a` - Denominator coefficients `[N+1]` or `[batch, N+1]`
    pub fn new(b: Tensor<R>, a: Tensor<R>) -> Self {
        Self { b, a }
    }

    /// Number of numerator coefficients per set.
    pub fn num_b(&self) -> usize {
        self.b.shape().last().copied().unwrap_or(0)
    }

    /// Number of denominator coefficients per set.
    pub fn num_a(&self) -> usize {
        self.a.shape().last().copied().unwrap_or(0)
    }

    /// Number of per-example coefficient sets, or `None` when one set is
    /// shared by the whole batch.
    pub fn batch_size(&self) -> Option<usize> {
        if self.b.ndim() == 2 {
            Some(self.b.shape()[0])
        } else {
            None
        }
    }
}

/// Zero-pole-gain filter representation.
///
/// Represents a digital filter by its zeros, poles, and gain:
/// ```text
/// H(z) = k * prod(z - zeros[i]) / prod(z - poles[i])
/// ```
///
/// Zeros and poles are stored as separate real and imaginary tensors.
#[derive(Debug, Clone)]
pub struct ZpkFilter<R: Runtime> {
    /// Real parts of zeros [num_zeros].
    pub zeros_real: Tensor<R>,
    /// Imaginary parts of zeros [num_zeros].
    pub zeros_imag: Tensor<R>,
    /// Real parts of poles [num_poles].
    pub poles_real: Tensor<R>,
    /// Imaginary parts of poles [num_poles].
    pub poles_imag: Tensor<R>,
    /// System gain.
    pub gain: f64,
}

impl<R: Runtime> ZpkFilter<R> {
    /// Create a new ZPK filter.
    pub fn new(
        zeros_real: Tensor<R>,
        zeros_imag: Tensor<R>,
        poles_real: Tensor<R>,
        poles_imag: Tensor<R>,
        gain: f64,
    ) -> Self {
        Self {
            zeros_real,
            zeros_imag,
            poles_real,
            poles_imag,
            gain,
        }
    }

    /// Get the number of zeros.
    pub fn num_zeros(&self) -> usize {
        self.zeros_real.shape()[0]
    }

    /// Get the number of poles.
    pub fn num_poles(&self) -> usize {
        self.poles_real.shape()[0]
    }
}

/// Analog filter in zero-pole-gain form.
///
/// Produced by the prototype designer (lowpass with cutoff at 1 rad/s) and by
/// the frequency transformations (real target band, rad/s).
#[derive(Debug, Clone)]
pub struct AnalogPrototype<R: Runtime> {
    /// Real parts of analog zeros.
    pub zeros_real: Tensor<R>,
    /// Imaginary parts of analog zeros.
    pub zeros_imag: Tensor<R>,
    /// Real parts of analog poles.
    pub poles_real: Tensor<R>,
    /// Imaginary parts of analog poles.
    pub poles_imag: Tensor<R>,
    /// System gain.
    pub gain: f64,
}

impl<R: Runtime> AnalogPrototype<R> {
    /// Create a new analog prototype.
    pub fn new(
        zeros_real: Tensor<R>,
        zeros_imag: Tensor<R>,
        poles_real: Tensor<R>,
        poles_imag: Tensor<R>,
        gain: f64,
    ) -> Self {
        Self {
            zeros_real,
            zeros_imag,
            poles_real,
            poles_imag,
            gain,
        }
    }
}

/// Band type for design functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BandType {
    /// Lowpass filter - passes frequencies below cutoff.
    Lowpass,
    /// Highpass filter - passes frequencies above cutoff.
    Highpass,
    /// Bandpass filter - passes frequencies between two cutoffs.
    Bandpass,
    /// Bandstop (notch) filter - rejects frequencies between two cutoffs.
    Bandstop,
}

impl BandType {
    /// Number of critical frequencies this band type needs.
    pub fn num_cutoffs(self) -> usize {
        match self {
            BandType::Lowpass | BandType::Highpass => 1,
            BandType::Bandpass | BandType::Bandstop => 2,
        }
    }
}

impl FromStr for BandType {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        match s {
            "low" | "lowpass" | "lp" => Ok(BandType::Lowpass),
            "high" | "highpass" | "hp" => Ok(BandType::Highpass),
            "band" | "bandpass" | "bp" | "pass" => Ok(BandType::Bandpass),
            "bandstop" | "bs" | "stop" => Ok(BandType::Bandstop),
            other => Err(FilterError::invalid(
                "btype",
                format!("unknown band type '{}'", other),
            )),
        }
    }
}

/// Filter output format for design functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOutput {
    /// Return as transfer function coefficients (b, a).
    #[default]
    Ba,
    /// Return as zeros, poles, gain.
    Zpk,
}

/// Normalization type for Bessel filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BesselNorm {
    /// Phase response reaches its midpoint at the cutoff; asymptotically
    /// matches a Butterworth of the same order (default).
    #[default]
    Phase,
    /// Group delay in the passband is `1/cutoff`.
    Delay,
    /// Magnitude is `1/√2` (−3 dB) at the cutoff.
    Mag,
}

/// IIR filter family selection, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterKind {
    /// Butterworth filter (maximally flat magnitude).
    #[default]
    Butterworth,
    /// Chebyshev Type I (equiripple passband).
    Chebyshev1,
    /// Chebyshev Type II (equiripple stopband).
    Chebyshev2,
    /// Elliptic/Cauer (equiripple both bands, sharpest transition).
    Elliptic,
    /// Bessel-Thomson (maximally flat group delay).
    Bessel,
}

impl FilterKind {
    /// Human readable family name.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Butterworth => "Butterworth",
            FilterKind::Chebyshev1 => "Chebyshev Type I",
            FilterKind::Chebyshev2 => "Chebyshev Type II",
            FilterKind::Elliptic => "Elliptic",
            FilterKind::Bessel => "Bessel",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        match s {
            "butter" | "butterworth" => Ok(FilterKind::Butterworth),
            "cheby1" | "chebyshev1" => Ok(FilterKind::Chebyshev1),
            "cheby2" | "chebyshev2" => Ok(FilterKind::Chebyshev2),
            "ellip" | "elliptic" | "cauer" => Ok(FilterKind::Elliptic),
            "bessel" => Ok(FilterKind::Bessel),
            other => Err(FilterError::invalid(
                "ftype",
                format!("unknown filter family '{}'", other),
            )),
        }
    }
}
