//! Host-side zero-pole-gain form used by the design pipeline.
//!
//! Every design stage maps a [`Zpk`] to a new [`Zpk`]. Tensor forms
//! ([`AnalogPrototype`], [`ZpkFilter`]) are produced only at the API boundary.

use super::helpers::tensor_to_f64;
use crate::error::{FilterError, FilterResult};
use crate::filter::types::{AnalogPrototype, ZpkFilter};
use num_complex::Complex64;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Zeros, poles, and gain with complex roots on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Zpk {
    /// Zeros.
    pub zeros: Vec<Complex64>,
    /// Poles.
    pub poles: Vec<Complex64>,
    /// Gain.
    pub gain: f64,
}

impl Zpk {
    /// Create a ZPK triple.
    pub fn new(zeros: Vec<Complex64>, poles: Vec<Complex64>, gain: f64) -> Self {
        Self { zeros, poles, gain }
    }

    /// Relative degree (excess of poles over zeros).
    pub fn degree(&self) -> FilterResult<usize> {
        self.poles
            .len()
            .checked_sub(self.zeros.len())
            .ok_or_else(|| FilterError::DesignError {
                context: format!(
                    "improper transfer function: {} zeros, {} poles",
                    self.zeros.len(),
                    self.poles.len()
                ),
            })
    }

    /// Tensor form of an analog filter.
    pub fn to_analog<R: Runtime>(&self, device: &R::Device) -> AnalogPrototype<R> {
        let [zr, zi, pr, pi] = self.split_tensors::<R>(device);
        AnalogPrototype::new(zr, zi, pr, pi, self.gain)
    }

    /// Tensor form of a digital filter.
    pub fn to_digital<R: Runtime>(&self, device: &R::Device) -> ZpkFilter<R> {
        let [zr, zi, pr, pi] = self.split_tensors::<R>(device);
        ZpkFilter::new(zr, zi, pr, pi, self.gain)
    }

    /// Read back an analog filter.
    pub fn from_analog<R: Runtime>(proto: &AnalogPrototype<R>) -> FilterResult<Self> {
        Ok(Self {
            zeros: join_complex(&proto.zeros_real, &proto.zeros_imag, "zeros")?,
            poles: join_complex(&proto.poles_real, &proto.poles_imag, "poles")?,
            gain: proto.gain,
        })
    }

    /// Read back a digital filter.
    pub fn from_digital<R: Runtime>(zpk: &ZpkFilter<R>) -> FilterResult<Self> {
        Ok(Self {
            zeros: join_complex(&zpk.zeros_real, &zpk.zeros_imag, "zeros")?,
            poles: join_complex(&zpk.poles_real, &zpk.poles_imag, "poles")?,
            gain: zpk.gain,
        })
    }

    fn split_tensors<R: Runtime>(&self, device: &R::Device) -> [Tensor<R>; 4] {
        let part = |roots: &[Complex64], f: fn(&Complex64) -> f64| {
            let data: Vec<f64> = roots.iter().map(f).collect();
            Tensor::<R>::from_slice(&data, &[data.len()], device)
        };
        [
            part(&self.zeros, |c| c.re),
            part(&self.zeros, |c| c.im),
            part(&self.poles, |c| c.re),
            part(&self.poles, |c| c.im),
        ]
    }
}

fn join_complex<R: Runtime>(
    re: &Tensor<R>,
    im: &Tensor<R>,
    arg: &'static str,
) -> FilterResult<Vec<Complex64>> {
    let re = tensor_to_f64(re, arg)?;
    let im = tensor_to_f64(im, arg)?;
    if re.len() != im.len() {
        return Err(FilterError::invalid(
            arg,
            format!(
                "real and imaginary parts differ in length ({} vs {})",
                re.len(),
                im.len()
            ),
        ));
    }
    Ok(re
        .into_iter()
        .zip(im)
        .map(|(r, i)| Complex64::new(r, i))
        .collect())
}

/// Product of `f(root)` over all roots; 1 for an empty set.
pub(crate) fn prod_map(roots: &[Complex64], f: impl Fn(Complex64) -> Complex64) -> Complex64 {
    roots
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &r| acc * f(r))
}

/// `Re(prod(-z) / prod(-p))`, the gain correction used by inverting maps.
pub(crate) fn neg_root_ratio(zeros: &[Complex64], poles: &[Complex64]) -> f64 {
    (prod_map(zeros, |z| -z) / prod_map(poles, |p| -p)).re
}
