//! Bessel-Thomson prototype.
//!
//! Poles are the roots of the reverse Bessel polynomial
//! `theta_N(s) = sum_k a_k s^k`, `a_k = (2N-k)! / (2^(N-k) k! (N-k)!)`.

use super::helpers::tensor_to_f64;
use super::zpk::{prod_map, Zpk};
use crate::error::{FilterError, FilterResult};
use crate::filter::types::BesselNorm;
use num_complex::Complex64;
use numr::algorithm::polynomial::PolynomialAlgorithms;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

const NEWTON_MAXITER: usize = 10;
const SECANT_MAXITER: usize = 50;

/// Coefficients `a_0..=a_N` of the reverse Bessel polynomial, ascending powers.
fn reverse_bessel_coeffs(order: usize) -> Vec<f64> {
    let n = order as f64;
    let mut a = vec![0.0; order + 1];
    a[order] = 1.0;
    for k in (0..order).rev() {
        let kf = k as f64;
        a[k] = a[k + 1] * (2.0 * n - kf) * (kf + 1.0) / (2.0 * (n - kf));
    }
    a
}

/// `(p(x), p'(x))` by Horner, coefficients in ascending powers.
fn eval_with_derivative(coeffs: &[f64], x: Complex64) -> (Complex64, Complex64) {
    let mut p = Complex64::new(0.0, 0.0);
    let mut dp = Complex64::new(0.0, 0.0);
    for &c in coeffs.iter().rev() {
        dp = dp * x + p;
        p = p * x + c;
    }
    (p, dp)
}

/// Roots of the reverse Bessel polynomial, conjugate symmetric.
///
/// Companion-matrix roots from `polyroots`, polished with Newton steps on the
/// host and then averaged with their mirrored conjugates.
fn reverse_bessel_roots<R, C>(client: &C, order: usize) -> FilterResult<Vec<Complex64>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    let coeffs = reverse_bessel_coeffs(order);
    let roots = client.polyroots(&Tensor::<R>::from_slice(&coeffs, &[order + 1], client.device()))?;
    let re = tensor_to_f64(&roots.roots_real, "roots")?;
    let im = tensor_to_f64(&roots.roots_imag, "roots")?;

    let mut x: Vec<Complex64> = re
        .into_iter()
        .zip(im)
        .map(|(r, i)| Complex64::new(r, i))
        .collect();
    if x.len() != order || x.iter().any(|v| !(v.re.is_finite() && v.im.is_finite())) {
        return Err(FilterError::DesignError {
            context: format!("Bessel polynomial of order {} has no finite roots", order),
        });
    }

    for xk in x.iter_mut() {
        for _ in 0..NEWTON_MAXITER {
            let (p, dp) = eval_with_derivative(&coeffs, *xk);
            let step = p / dp;
            if !(step.re.is_finite() && step.im.is_finite()) {
                break;
            }
            *xk -= step;
            if step.norm() <= f64::EPSILON * xk.norm() {
                break;
            }
        }
    }

    x.sort_by(|a, b| b.im.total_cmp(&a.im));
    let mirrored: Vec<Complex64> = x.iter().rev().map(|v| v.conj()).collect();
    let x: Vec<Complex64> = x
        .iter()
        .zip(&mirrored)
        .map(|(&a, &b)| (a + b) / 2.0)
        .collect();

    // Vieta: the roots sum to -a_{N-1}.
    let expected = -coeffs[order - 1];
    let sum: Complex64 = x.iter().sum();
    if (sum.re - expected).abs() > 1e-10 * expected.abs() || sum.im.abs() > 1e-10 {
        return Err(FilterError::DesignError {
            context: format!("Bessel poles of order {} failed to converge", order),
        });
    }
    Ok(x)
}

/// Frequency where `|k / prod(jw - p)| = 1/sqrt(2)`, by the secant method.
fn magnitude_norm_factor(poles: &[Complex64], gain: f64) -> FilterResult<f64> {
    let cutoff = |w: f64| {
        let s = Complex64::new(0.0, w);
        (gain / prod_map(poles, |p| s - p)).norm() - std::f64::consts::FRAC_1_SQRT_2
    };

    let mut p0 = 1.5;
    let mut p1 = p0 * (1.0 + 1e-4) + 1e-4;
    let (mut q0, mut q1) = (cutoff(p0), cutoff(p1));
    for _ in 0..SECANT_MAXITER {
        if q1 == q0 {
            break;
        }
        let p = p1 - q1 * (p1 - p0) / (q1 - q0);
        if (p - p1).abs() <= 1e-15 * p.abs() {
            return Ok(p);
        }
        p0 = p1;
        q0 = q1;
        p1 = p;
        q1 = cutoff(p1);
    }
    if q1.abs() < 1e-12 {
        return Ok(p1);
    }
    Err(FilterError::DesignError {
        context: "Bessel magnitude normalization failed to converge".to_string(),
    })
}

/// Bessel-Thomson analog lowpass prototype.
pub fn besselap<R, C>(client: &C, order: usize, norm: BesselNorm) -> FilterResult<Zpk>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    if order < 1 {
        return Err(FilterError::InvalidOrder { order });
    }

    let a0 = reverse_bessel_coeffs(order)[0];
    let mut poles = reverse_bessel_roots(client, order)?;
    let n = order as f64;

    let gain = match norm {
        BesselNorm::Phase => {
            let scale = 10f64.powf(-a0.log10() / n);
            poles.iter_mut().for_each(|p| *p *= scale);
            1.0
        }
        BesselNorm::Delay => a0,
        BesselNorm::Mag => {
            let w = magnitude_norm_factor(&poles, a0)?;
            poles.iter_mut().for_each(|p| *p /= w);
            w.powi(-(order as i32)) * a0
        }
    };

    Ok(Zpk::new(Vec::new(), poles, gain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::{CpuClient, CpuDevice};

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn response(zpk: &Zpk, w: f64) -> Complex64 {
        let s = Complex64::new(0.0, w);
        zpk.gain / prod_map(&zpk.poles, |p| s - p)
    }

    #[test]
    fn test_reverse_bessel_coeffs() {
        // theta_3(s) = s^3 + 6s^2 + 15s + 15
        assert_eq!(reverse_bessel_coeffs(3), vec![15.0, 15.0, 6.0, 1.0]);
        // theta_4(s) = s^4 + 10s^3 + 45s^2 + 105s + 105
        assert_eq!(reverse_bessel_coeffs(4), vec![105.0, 105.0, 45.0, 10.0, 1.0]);
    }

    #[test]
    fn test_besselap_delay_order_2() {
        let (client, _device) = setup();
        // s^2 + 3s + 3 has roots -1.5 +- j*sqrt(3)/2
        let zpk = besselap(&client, 2, BesselNorm::Delay).unwrap();
        assert_eq!(zpk.gain, 3.0);
        let h = 3f64.sqrt() / 2.0;
        assert!((zpk.poles[0] - Complex64::new(-1.5, h)).norm() < 1e-14);
        assert!((zpk.poles[1] - Complex64::new(-1.5, -h)).norm() < 1e-14);
    }

    #[test]
    fn test_besselap_phase_matches_scipy() {
        let (client, _device) = setup();
        // scipy.signal.besselap(3): unit gain, poles scaled by 15^(-1/3)
        let zpk = besselap(&client, 3, BesselNorm::Phase).unwrap();
        assert_eq!(zpk.gain, 1.0);
        let real = zpk
            .poles
            .iter()
            .find(|p| p.im == 0.0)
            .copied()
            .unwrap();
        assert!((real.re + 0.941_600_026_533_206_7).abs() < 1e-12);
        // DC gain 1
        assert!((response(&zpk, 0.0).norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_besselap_conjugate_symmetric_and_stable() {
        let (client, _device) = setup();
        for order in 1..=12 {
            let zpk = besselap(&client, order, BesselNorm::Phase).unwrap();
            assert_eq!(zpk.poles.len(), order);
            assert!(zpk.poles.iter().all(|p| p.re < 0.0));
            for p in &zpk.poles {
                assert!(zpk
                    .poles
                    .iter()
                    .any(|q| (q.conj() - p).norm() < 1e-12));
            }
        }
    }

    #[test]
    fn test_besselap_mag_is_3db_at_unity() {
        let (client, _device) = setup();
        for order in [2, 4, 7] {
            let zpk = besselap(&client, order, BesselNorm::Mag).unwrap();
            let mag = response(&zpk, 1.0).norm();
            assert!((mag - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-10);
        }
    }
}
