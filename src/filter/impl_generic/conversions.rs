//! Zero-pole-gain to transfer function conversion.
//!
//! Roots are expanded with [`PolynomialAlgorithms::polyfromroots`], which keeps
//! only the real part of the product. Roots are therefore checked for
//! conjugate pairing first; an unpaired complex root is reported instead of
//! silently dropping its imaginary contribution.

use super::helpers::tensor_to_f64;
use super::zpk::Zpk;
use crate::error::{FilterError, FilterResult};
use crate::filter::spec::Domain;
use crate::filter::types::{TransferFunction, ZpkFilter};
use num_complex::Complex64;
use numr::algorithm::polynomial::PolynomialAlgorithms;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Conjugate mismatch allowed relative to the root magnitude.
const CONJUGATE_TOL: f64 = 1e-10;

/// Every complex root must have a conjugate partner.
fn check_conjugate_pairs(roots: &[Complex64], what: &str) -> FilterResult<()> {
    let mut unmatched: Vec<Complex64> = Vec::new();
    for &r in roots {
        let tol = CONJUGATE_TOL * r.norm().max(1.0);
        if r.im.abs() <= tol {
            continue;
        }
        match unmatched.iter().position(|u| (u.conj() - r).norm() <= tol) {
            Some(i) => {
                unmatched.swap_remove(i);
            }
            None => unmatched.push(r),
        }
    }
    match unmatched.first() {
        Some(r) => Err(FilterError::NumericalInstability {
            context: format!(
                "{} root {} has no conjugate partner; polynomial would not be real",
                what, r
            ),
        }),
        None => Ok(()),
    }
}

/// Monic real polynomial with the given roots, descending powers.
fn real_poly<R, C>(client: &C, roots: &[Complex64], what: &str) -> FilterResult<Vec<f64>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    check_conjugate_pairs(roots, what)?;
    let device = client.device();
    let re: Vec<f64> = roots.iter().map(|r| r.re).collect();
    let im: Vec<f64> = roots.iter().map(|r| r.im).collect();
    let coeffs = client.polyfromroots(
        &Tensor::<R>::from_slice(&re, &[re.len()], device),
        &Tensor::<R>::from_slice(&im, &[im.len()], device),
    )?;
    // polyfromroots returns ascending powers
    let mut coeffs = tensor_to_f64(&coeffs, "coefficients")?;
    coeffs.reverse();
    Ok(coeffs)
}

/// Convert zeros, poles, and gain into `(b, a)`, normalized so `a[0] = 1`.
pub fn zpk2tf<R, C>(client: &C, zpk: &Zpk) -> FilterResult<(Vec<f64>, Vec<f64>)>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    let mut b = real_poly(client, &zpk.zeros, "numerator")?;
    let mut a = real_poly(client, &zpk.poles, "denominator")?;
    b.iter_mut().for_each(|c| *c *= zpk.gain);

    let a0 = a[0];
    if a0 != 1.0 {
        if a0 == 0.0 || !a0.is_finite() {
            return Err(FilterError::NumericalInstability {
                context: format!("leading denominator coefficient is {}", a0),
            });
        }
        b.iter_mut().for_each(|c| *c /= a0);
        a.iter_mut().for_each(|c| *c /= a0);
    }
    Ok((b, a))
}

/// Verify every pole lies strictly inside the stability region of `domain`.
pub fn check_stability(zpk: &Zpk, domain: &Domain) -> FilterResult<()> {
    let unstable = zpk.poles.iter().find(|p| match domain {
        Domain::Analog => !(p.re < 0.0),
        Domain::Digital { .. } => !(p.norm() < 1.0),
    });
    match unstable {
        Some(p) => Err(FilterError::NumericalInstability {
            context: format!(
                "pole {} lies outside the stability region of the {} filter",
                p,
                if domain.is_analog() { "analog" } else { "digital" }
            ),
        }),
        None => Ok(()),
    }
}

/// Convert a tensor ZPK filter to transfer function form (generic over Runtime).
pub fn zpk2tf_impl<R, C>(client: &C, zpk: &ZpkFilter<R>) -> FilterResult<TransferFunction<R>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    let (b, a) = zpk2tf(client, &Zpk::from_digital(zpk)?)?;
    let device = client.device();
    Ok(TransferFunction::new(
        Tensor::<R>::from_slice(&b, &[b.len()], device),
        Tensor::<R>::from_slice(&a, &[a.len()], device),
    ))
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

    #[test]
    fn test_conjugate_pair_expands_to_real_quadratic() {
        let (client, _device) = setup();
        // (z - (1+2j))(z - (1-2j)) = z^2 - 2z + 5
        let zpk = Zpk::new(
            Vec::new(),
            vec![Complex64::new(1.0, 2.0), Complex64::new(1.0, -2.0)],
            1.0,
        );
        let (b, a) = zpk2tf(&client, &zpk).unwrap();
        assert_eq!(b, vec![1.0]);
        assert_eq!(a.len(), 3);
        assert!((a[0] - 1.0).abs() < 1e-15);
        assert!((a[1] + 2.0).abs() < 1e-14);
        assert!((a[2] - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_zpk2tf_scales_numerator() {
        let (client, _device) = setup();
        let zpk = Zpk::new(
            vec![Complex64::new(-1.0, 0.0)],
            vec![Complex64::new(0.5, 0.0)],
            2.0,
        );
        let (b, a) = zpk2tf(&client, &zpk).unwrap();
        assert_eq!(b, vec![2.0, 2.0]);
        assert_eq!(a, vec![1.0, -0.5]);
    }

    #[test]
    fn test_unpaired_root_is_rejected() {
        let (client, _device) = setup();
        let zpk = Zpk::new(Vec::new(), vec![Complex64::new(0.5, 0.5)], 1.0);
        assert!(matches!(
            zpk2tf(&client, &zpk),
            Err(FilterError::NumericalInstability { .. })
        ));

        // Two roots in the upper half-plane do not pair with each other.
        let zpk = Zpk::new(
            Vec::new(),
            vec![Complex64::new(0.5, 0.5), Complex64::new(0.5, 0.5)],
            1.0,
        );
        assert!(zpk2tf(&client, &zpk).is_err());
    }

    #[test]
    fn test_stability_regions() {
        let zpk = Zpk::new(Vec::new(), vec![Complex64::new(-0.5, 0.0)], 1.0);
        assert!(check_stability(&zpk, &Domain::Analog).is_ok());
        assert!(check_stability(&zpk, &Domain::Digital { sample_rate: 2.0 }).is_ok());

        let zpk = Zpk::new(Vec::new(), vec![Complex64::new(-1.5, 0.0)], 1.0);
        assert!(check_stability(&zpk, &Domain::Analog).is_ok());
        assert!(check_stability(&zpk, &Domain::Digital { sample_rate: 2.0 }).is_err());

        let zpk = Zpk::new(Vec::new(), vec![Complex64::new(0.2, 0.0)], 1.0);
        assert!(check_stability(&zpk, &Domain::Analog).is_err());
    }
}
