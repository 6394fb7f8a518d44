//! Analog lowpass prototypes.
//!
//! Every prototype is normalized to a cutoff of 1 rad/s. Pole placement, zero
//! placement, and gain follow SciPy's `buttap`, `cheb1ap`, `cheb2ap`,
//! `ellipap`, and `besselap` so that designed coefficients agree with SciPy to
//! rounding.

use super::bessel::besselap;
use super::elliptic::ellipap;
use super::zpk::{prod_map, Zpk};
use crate::error::{FilterError, FilterResult};
use crate::filter::spec::FilterFamily;
use crate::filter::types::AnalogPrototype;
use num_complex::Complex64;
use numr::algorithm::polynomial::PolynomialAlgorithms;
use numr::runtime::{Runtime, RuntimeClient};
use std::f64::consts::PI;

/// `10^x - 1` without cancellation for small `x`.
pub(crate) fn pow10m1(x: f64) -> f64 {
    (std::f64::consts::LN_10 * x).exp_m1()
}

/// `m = -N+1, -N+3, ..., N-1`.
fn symmetric_indices(order: usize) -> impl Iterator<Item = f64> {
    let n = order as i64;
    (0..n).map(move |i| (-n + 1 + 2 * i) as f64)
}

fn check_order(order: usize) -> FilterResult<()> {
    if order < 1 {
        return Err(FilterError::InvalidOrder { order });
    }
    Ok(())
}

/// Butterworth prototype: poles evenly spaced on the left unit semicircle.
pub fn buttap(order: usize) -> FilterResult<Zpk> {
    check_order(order)?;
    let n = order as f64;
    let poles = symmetric_indices(order)
        .map(|m| -Complex64::new(0.0, PI * m / (2.0 * n)).exp())
        .collect();
    Ok(Zpk::new(Vec::new(), poles, 1.0))
}

/// Chebyshev Type I prototype with `rp` dB of passband ripple.
pub fn cheb1ap(order: usize, rp: f64) -> FilterResult<Zpk> {
    check_order(order)?;
    let n = order as f64;
    let eps = pow10m1(0.1 * rp).sqrt();
    let mu = (1.0 / eps).asinh() / n;

    let poles: Vec<Complex64> = symmetric_indices(order)
        .map(|m| -Complex64::new(mu, PI * m / (2.0 * n)).sinh())
        .collect();

    let mut gain = prod_map(&poles, |p| -p).re;
    if order % 2 == 0 {
        gain /= (1.0 + eps * eps).sqrt();
    }
    Ok(Zpk::new(Vec::new(), poles, gain))
}

/// Chebyshev Type II prototype with `rs` dB of stopband attenuation.
pub fn cheb2ap(order: usize, rs: f64) -> FilterResult<Zpk> {
    check_order(order)?;
    let n = order as f64;
    let de = 1.0 / pow10m1(0.1 * rs).sqrt();
    let mu = (1.0 / de).asinh() / n;

    // No zero at infinity for odd orders.
    let zeros: Vec<Complex64> = symmetric_indices(order)
        .filter(|&m| m != 0.0)
        .map(|m| -(Complex64::i() / (m * PI / (2.0 * n)).sin()).conj())
        .collect();

    let (sinh_mu, cosh_mu) = (mu.sinh(), mu.cosh());
    let poles: Vec<Complex64> = symmetric_indices(order)
        .map(|m| {
            let q = -Complex64::new(0.0, PI * m / (2.0 * n)).exp();
            Complex64::new(1.0, 0.0) / Complex64::new(sinh_mu * q.re, cosh_mu * q.im)
        })
        .collect();

    let gain = (prod_map(&poles, |p| -p) / prod_map(&zeros, |z| -z)).re;
    Ok(Zpk::new(zeros, poles, gain))
}

/// Host-side prototype for a resolved family.
pub fn analog_prototype<R, C>(
    client: &C,
    family: &FilterFamily<f64>,
    order: usize,
) -> FilterResult<Zpk>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    let zpk = match *family {
        FilterFamily::Butterworth => buttap(order)?,
        FilterFamily::Chebyshev1 { ripple } => cheb1ap(order, ripple)?,
        FilterFamily::Chebyshev2 {
            stopband_attenuation,
        } => cheb2ap(order, stopband_attenuation)?,
        FilterFamily::Elliptic {
            ripple,
            stopband_attenuation,
        } => ellipap(order, ripple, stopband_attenuation)?,
        FilterFamily::Bessel { norm } => besselap(client, order, norm)?,
    };
    tracing::trace!(
        family = %family.kind(),
        order,
        zeros = zpk.zeros.len(),
        poles = zpk.poles.len(),
        "analog prototype"
    );
    Ok(zpk)
}

/// Design an analog lowpass prototype as tensors (generic over Runtime).
pub fn analog_prototype_impl<R, C>(
    client: &C,
    family: &FilterFamily<f64>,
    order: usize,
) -> FilterResult<AnalogPrototype<R>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    Ok(analog_prototype(client, family, order)?.to_analog(client.device()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::impl_generic::zpk::neg_root_ratio;

    fn dc_gain(zpk: &Zpk) -> f64 {
        zpk.gain * neg_root_ratio(&zpk.zeros, &zpk.poles)
    }

    fn assert_close(a: Complex64, b: Complex64, tol: f64) {
        assert!((a - b).norm() < tol, "{} != {}", a, b);
    }

    #[test]
    fn test_buttap_order_3() {
        let zpk = buttap(3).unwrap();
        assert!(zpk.zeros.is_empty());
        assert_eq!(zpk.gain, 1.0);
        let h = 3f64.sqrt() / 2.0;
        assert_close(zpk.poles[0], Complex64::new(-0.5, h), 1e-15);
        assert_close(zpk.poles[1], Complex64::new(-1.0, 0.0), 1e-15);
        assert_close(zpk.poles[2], Complex64::new(-0.5, -h), 1e-15);
    }

    #[test]
    fn test_cheb1ap_matches_scipy() {
        // scipy.signal.cheb1ap(2, 1)
        let zpk = cheb1ap(2, 1.0).unwrap();
        let pole = Complex64::new(-0.548_867_164_281_963_8, 0.895_128_574_019_913_6);
        assert_close(zpk.poles[0], pole, 1e-12);
        assert_close(zpk.poles[1], pole.conj(), 1e-12);
        assert!((zpk.gain - 0.982_613_364_180_136).abs() < 1e-12);
    }

    #[test]
    fn test_cheb2ap_matches_scipy() {
        // scipy.signal.cheb2ap(3, 20)
        let zpk = cheb2ap(3, 20.0).unwrap();
        assert_eq!(zpk.zeros.len(), 2);
        for z in &zpk.zeros {
            assert!(z.re.abs() < 1e-15);
            assert!((z.im.abs() - 1.154_700_538_4).abs() < 1e-9);
        }
        assert_close(zpk.zeros[0], zpk.zeros[1].conj(), 1e-15);
        assert_eq!(zpk.poles.len(), 3);
        // DC gain of a Chebyshev II prototype is unity.
        assert!((dc_gain(&zpk) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dc_gain_normalization() {
        assert!((dc_gain(&buttap(5).unwrap()) - 1.0).abs() < 1e-12);
        assert!((dc_gain(&cheb1ap(3, 0.5).unwrap()) - 1.0).abs() < 1e-12);
        // Even-order Chebyshev I sits at the bottom of the ripple at DC.
        let expected = 10f64.powf(-0.5 / 20.0);
        assert!((dc_gain(&cheb1ap(4, 0.5).unwrap()) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_order() {
        assert_eq!(buttap(0), Err(FilterError::InvalidOrder { order: 0 }));
        assert!(cheb1ap(0, 1.0).is_err());
        assert!(cheb2ap(0, 40.0).is_err());
    }
}
