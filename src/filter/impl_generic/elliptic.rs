//! Elliptic (Cauer) prototype and the special functions it needs.
//!
//! # Algorithm
//!
//! The prototype follows the classical construction (Orfanidis, "Lecture Notes
//! on Elliptic Filter Design"):
//!
//! 1. Selectivity `m` from the degree equation, solved with nome series.
//! 2. Zeros `j / (sqrt(m) * sn(j*K/N, m))` for `j = 1 - N%2, 3 - N%2, ...`.
//! 3. Poles from `sn, cn, dn` at the same points combined with
//!    `sn, cn, dn` of `v0` on the complementary modulus, where `v0` comes from
//!    the inverse Jacobi `sc` of `1/eps`.
//!
//! Parameters are in SciPy's convention: `m = k^2`.

use super::prototypes::pow10m1;
use super::zpk::{prod_map, Zpk};
use crate::error::{FilterError, FilterResult};
use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, PI};

const EPSILON: f64 = 2e-16;
const MACHEP: f64 = 1.110_223_024_625_156_5e-16;
/// Terms in the nome series of the degree equation.
const ELLIPDEG_MMAX: i32 = 7;
const ARC_JAC_SN_MAXITER: usize = 10;

/// Arithmetic-geometric mean of two positive numbers.
fn agm(mut a: f64, mut b: f64) -> f64 {
    for _ in 0..64 {
        if (a - b).abs() <= MACHEP * a {
            break;
        }
        let next = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = next;
    }
    a
}

/// Complete elliptic integral of the first kind `K(m)`, `0 <= m < 1`.
pub fn ellipk(m: f64) -> f64 {
    if m >= 1.0 {
        return f64::INFINITY;
    }
    FRAC_PI_2 / agm(1.0, (1.0 - m).sqrt())
}

/// `K(1 - p)`, accurate for small `p`.
pub fn ellipkm1(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::INFINITY;
    }
    FRAC_PI_2 / agm(1.0, p.sqrt())
}

/// Jacobi elliptic functions `(sn, cn, dn)` of real argument `u`, `0 <= m <= 1`.
///
/// Descending Landen transformation as in Cephes `ellpj`.
pub fn ellipj(u: f64, m: f64) -> (f64, f64, f64) {
    if !(0.0..=1.0).contains(&m) {
        return (f64::NAN, f64::NAN, f64::NAN);
    }

    if m < 1.0e-9 {
        let t = u.sin();
        let b = u.cos();
        let ai = 0.25 * m * (u - t * b);
        return (t - ai * b, b + ai * t, 1.0 - 0.5 * m * t * t);
    }

    if m >= 0.999_999_999_9 {
        let ai = 0.25 * (1.0 - m);
        let b = u.cosh();
        let t = u.tanh();
        let phi = 1.0 / b;
        let twon = b * u.sinh();
        let sn = t + ai * (twon - u) / (b * b);
        let ai = ai * t * phi;
        let cn = phi - ai * (twon - u);
        let dn = phi + ai * (twon + u);
        return (sn, cn, dn);
    }

    let mut a = [0.0f64; 9];
    let mut c = [0.0f64; 9];
    a[0] = 1.0;
    c[0] = m.sqrt();
    let mut b = (1.0 - m).sqrt();
    let mut twon = 1.0;
    let mut i = 0;

    while (c[i] / a[i]).abs() > MACHEP {
        if i > 7 {
            break;
        }
        let ai = a[i];
        i += 1;
        c[i] = (ai - b) / 2.0;
        let t = (ai * b).sqrt();
        a[i] = (ai + b) / 2.0;
        b = t;
        twon *= 2.0;
    }

    let mut phi = twon * a[i] * u;
    let mut prev = phi;
    while i > 0 {
        let t = c[i] * phi.sin() / a[i];
        prev = phi;
        phi = (t.asin() + phi) / 2.0;
        i -= 1;
    }

    let sn = phi.sin();
    let cn = phi.cos();
    let dnfix = cn / (phi - prev).cos();
    let dn = if dnfix.abs() < 0.1 {
        (1.0 - m * sn * sn).sqrt()
    } else {
        dnfix
    };
    (sn, cn, dn)
}

/// Solve the degree equation: the modulus `m` of an order `n` filter whose
/// discrimination modulus is `m1`.
fn ellipdeg(n: usize, m1: f64) -> f64 {
    let k1 = ellipk(m1);
    let k1p = ellipkm1(m1);
    let q1 = (-PI * k1p / k1).exp();
    let q = q1.powf(1.0 / n as f64);

    let num: f64 = (0..=ELLIPDEG_MMAX).map(|i| q.powi(i * (i + 1))).sum();
    let den: f64 = 1.0
        + 2.0
            * (1..=ELLIPDEG_MMAX + 1)
                .map(|i| q.powi(i * i))
                .sum::<f64>();
    16.0 * q * (num / den).powi(4)
}

fn complement(kx: Complex64) -> Complex64 {
    ((1.0 - kx) * (1.0 + kx)).sqrt()
}

/// Inverse Jacobi `sn` of complex argument via the Landen sequence.
fn arc_jac_sn(w: Complex64, m: f64) -> FilterResult<Complex64> {
    let k = m.sqrt();
    if k > 1.0 {
        return Ok(Complex64::new(f64::NAN, f64::NAN));
    }
    if k == 1.0 {
        return Ok(w.atanh());
    }

    let mut ks = vec![k];
    while let Some(&last) = ks.last() {
        if last == 0.0 {
            break;
        }
        if ks.len() > ARC_JAC_SN_MAXITER {
            return Err(FilterError::DesignError {
                context: "Landen transformation not converging".to_string(),
            });
        }
        let kp = ((1.0 - last) * (1.0 + last)).sqrt();
        ks.push((1.0 - kp) / (1.0 + kp));
    }

    let capk: f64 = ks[1..].iter().map(|kn| 1.0 + kn).product::<f64>() * FRAC_PI_2;

    let mut wn = w;
    for pair in ks.windows(2) {
        let (kn, knext) = (pair[0], pair[1]);
        wn = 2.0 * wn / ((1.0 + knext) * (1.0 + complement(kn * wn)));
    }

    // asin(jy) = j*asinh(y), without the cancellation of the log form.
    let u = if wn.re == 0.0 {
        Complex64::new(0.0, wn.im.asinh())
    } else {
        wn.asin()
    };
    Ok(capk * (2.0 / PI) * u)
}

/// Real inverse Jacobi `sc`: `v` with `sc(v, m) = w`.
fn arc_jac_sc1(w: f64, m: f64) -> FilterResult<f64> {
    let z = arc_jac_sn(Complex64::new(0.0, w), m)?;
    if z.re.abs() > 1e-14 {
        return Err(FilterError::DesignError {
            context: format!("inverse Jacobi sc is not imaginary (real part {:e})", z.re),
        });
    }
    Ok(z.im)
}

/// Elliptic analog lowpass prototype with `rp` dB passband ripple and `rs` dB
/// stopband attenuation.
pub fn ellipap(order: usize, rp: f64, rs: f64) -> FilterResult<Zpk> {
    if order < 1 {
        return Err(FilterError::InvalidOrder { order });
    }

    if order == 1 {
        let p = -(1.0 / pow10m1(0.1 * rp)).sqrt();
        return Ok(Zpk::new(Vec::new(), vec![Complex64::new(p, 0.0)], -p));
    }

    let n = order as f64;
    let eps_sq = pow10m1(0.1 * rp);
    let eps = eps_sq.sqrt();
    let ck1_sq = eps_sq / pow10m1(0.1 * rs);
    if ck1_sq == 0.0 {
        return Err(FilterError::DesignError {
            context: format!(
                "cannot design an elliptic filter with rp={} dB and rs={} dB",
                rp, rs
            ),
        });
    }

    let k1 = ellipk(ck1_sq);
    let m = ellipdeg(order, ck1_sq);
    let capk = ellipk(m);

    let sncndn: Vec<(f64, f64, f64)> = ((1 - order % 2)..order)
        .step_by(2)
        .map(|j| ellipj(j as f64 * capk / n, m))
        .collect();

    let mut zeros: Vec<Complex64> = sncndn
        .iter()
        .filter(|(s, _, _)| s.abs() > EPSILON)
        .map(|&(s, _, _)| Complex64::new(0.0, 1.0 / (m.sqrt() * s)))
        .collect();
    let conj: Vec<Complex64> = zeros.iter().map(|z| z.conj()).collect();
    zeros.extend(conj);

    let r = arc_jac_sc1(1.0 / eps, ck1_sq)?;
    let v0 = capk * r / (n * k1);
    let (sv, cv, dv) = ellipj(v0, 1.0 - m);

    let mut poles: Vec<Complex64> = sncndn
        .iter()
        .map(|&(s, c, d)| {
            -Complex64::new(c * d * sv * cv, s * dv) / (1.0 - (d * sv).powi(2))
        })
        .collect();

    let conj: Vec<Complex64> = if order % 2 == 1 {
        let norm = poles.iter().map(|p| p.norm_sqr()).sum::<f64>().sqrt();
        poles
            .iter()
            .filter(|p| p.im.abs() > EPSILON * norm)
            .map(|p| p.conj())
            .collect()
    } else {
        poles.iter().map(|p| p.conj()).collect()
    };
    poles.extend(conj);

    let mut gain = (prod_map(&poles, |p| -p) / prod_map(&zeros, |z| -z)).re;
    if order % 2 == 0 {
        gain /= (1.0 + eps_sq).sqrt();
    }

    Ok(Zpk::new(zeros, poles, gain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipk_known_values() {
        assert!((ellipk(0.0) - FRAC_PI_2).abs() < 1e-15);
        // K(0.5) = 1.854074677301372
        assert!((ellipk(0.5) - 1.854_074_677_301_372).abs() < 1e-14);
        assert!((ellipkm1(0.5) - ellipk(0.5)).abs() < 1e-14);
        assert!(ellipk(1.0).is_infinite());
    }

    #[test]
    fn test_ellipj_identities() {
        for &m in &[0.0, 1e-12, 0.3, 0.9, 0.999_999_999_99] {
            for &u in &[0.1, 0.7, 1.3, 2.5] {
                let (sn, cn, dn) = ellipj(u, m);
                assert!((sn * sn + cn * cn - 1.0).abs() < 1e-12, "m={} u={}", m, u);
                assert!((dn * dn + m * sn * sn - 1.0).abs() < 1e-12, "m={} u={}", m, u);
            }
        }
        // sn(K, m) = 1
        let m = 0.6;
        let (sn, cn, _) = ellipj(ellipk(m), m);
        assert!((sn - 1.0).abs() < 1e-12);
        assert!(cn.abs() < 1e-7);
    }

    #[test]
    fn test_arc_jac_sc1_inverts_sc() {
        let m = 0.2;
        let v = arc_jac_sc1(0.75, m).unwrap();
        // sc(v, 1 - m) = 0.75 in the Jacobi imaginary transformation
        let (sn, cn, _) = ellipj(v, 1.0 - m);
        assert!((sn / cn - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_ellipap_order_one() {
        let zpk = ellipap(1, 1.0, 40.0).unwrap();
        assert!(zpk.zeros.is_empty());
        assert_eq!(zpk.poles.len(), 1);
        assert!((zpk.gain + zpk.poles[0].re).abs() < 1e-15);
    }

    #[test]
    fn test_ellipap_structure() {
        for order in 2..=8 {
            let zpk = ellipap(order, 0.5, 20.0).unwrap();
            assert_eq!(zpk.poles.len(), order);
            assert_eq!(zpk.zeros.len(), order - order % 2);
            assert!(zpk.poles.iter().all(|p| p.re < 0.0));
            assert!(zpk.zeros.iter().all(|z| z.re == 0.0 && z.im.abs() > 1.0));
        }
    }

    #[test]
    fn test_ellipap_passband_ripple() {
        // |H(j0)| is 1 for odd order and 10^(-rp/20) for even order;
        // |H(j1)| is 10^(-rp/20) for both.
        let rp = 1.0;
        for order in 2..=6 {
            let zpk = ellipap(order, rp, 40.0).unwrap();
            let h = |w: f64| {
                let s = Complex64::new(0.0, w);
                (zpk.gain * prod_map(&zpk.zeros, |z| s - z) / prod_map(&zpk.poles, |p| s - p))
                    .norm()
            };
            let edge = 10f64.powf(-rp / 20.0);
            assert!((h(1.0) - edge).abs() < 1e-9, "order {}", order);
            let dc = if order % 2 == 0 { edge } else { 1.0 };
            assert!((h(0.0) - dc).abs() < 1e-9, "order {}", order);
        }
    }

    #[test]
    fn test_ellipap_degenerate() {
        assert!(matches!(
            ellipap(4, 1.0, 4000.0),
            Err(FilterError::DesignError { .. })
        ));
        assert_eq!(
            ellipap(0, 1.0, 40.0),
            Err(FilterError::InvalidOrder { order: 0 })
        );
    }
}
