//! Frequency transformations for analog filter prototypes.
//!
//! These functions transform a lowpass analog prototype (cutoff = 1 rad/s)
//! to other filter types (highpass, bandpass, bandstop) with specified cutoffs.
//! They mirror SciPy's `lp2lp_zpk`, `lp2hp_zpk`, `lp2bp_zpk`, and `lp2bs_zpk`,
//! and preserve conjugate symmetry of the roots.

use super::zpk::{neg_root_ratio, Zpk};
use crate::error::{FilterError, FilterResult};
use crate::filter::types::{AnalogPrototype, BandType};
use num_complex::Complex64;
use numr::runtime::{Runtime, RuntimeClient};

/// Transform lowpass prototype to lowpass with cutoff `wo`.
///
/// Transformation: s → s/ω₀
pub fn lp2lp_zpk(zpk: &Zpk, wo: f64) -> FilterResult<Zpk> {
    let degree = zpk.degree()?;
    Ok(Zpk::new(
        zpk.zeros.iter().map(|&z| z * wo).collect(),
        zpk.poles.iter().map(|&p| p * wo).collect(),
        zpk.gain * wo.powi(degree as i32),
    ))
}

/// Transform lowpass prototype to highpass with cutoff `wo`.
///
/// Transformation: s → ω₀/s
///
/// Zeros at infinity map to the origin.
pub fn lp2hp_zpk(zpk: &Zpk, wo: f64) -> FilterResult<Zpk> {
    let degree = zpk.degree()?;
    let mut zeros: Vec<Complex64> = zpk.zeros.iter().map(|&z| wo / z).collect();
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
    Ok(Zpk::new(
        zeros,
        zpk.poles.iter().map(|&p| wo / p).collect(),
        zpk.gain * neg_root_ratio(&zpk.zeros, &zpk.poles),
    ))
}

/// Both roots of `s^2 - 2*r*s + wo^2`, i.e. `r ± sqrt(r^2 - wo^2)`.
fn split_roots(scaled: &[Complex64], wo: f64) -> Vec<Complex64> {
    let disc: Vec<Complex64> = scaled.iter().map(|&r| (r * r - wo * wo).sqrt()).collect();
    scaled
        .iter()
        .zip(&disc)
        .map(|(&r, &d)| r + d)
        .chain(scaled.iter().zip(&disc).map(|(&r, &d)| r - d))
        .collect()
}

/// Transform lowpass prototype to bandpass with center `wo` and bandwidth `bw`.
///
/// Transformation: s → (s² + ω₀²)/(B·s)
///
/// Doubles the order; zeros at infinity become zeros at the origin.
pub fn lp2bp_zpk(zpk: &Zpk, wo: f64, bw: f64) -> FilterResult<Zpk> {
    let degree = zpk.degree()?;
    let half = bw / 2.0;

    let z_lp: Vec<Complex64> = zpk.zeros.iter().map(|&z| z * half).collect();
    let p_lp: Vec<Complex64> = zpk.poles.iter().map(|&p| p * half).collect();

    let mut zeros = split_roots(&z_lp, wo);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Ok(Zpk::new(
        zeros,
        split_roots(&p_lp, wo),
        zpk.gain * bw.powi(degree as i32),
    ))
}

/// Transform lowpass prototype to bandstop with center `wo` and bandwidth `bw`.
///
/// Transformation: s → (B·s)/(s² + ω₀²)
///
/// Zeros at infinity become zeros at `±jω₀`.
pub fn lp2bs_zpk(zpk: &Zpk, wo: f64, bw: f64) -> FilterResult<Zpk> {
    let degree = zpk.degree()?;
    let half = bw / 2.0;

    let z_hp: Vec<Complex64> = zpk.zeros.iter().map(|&z| half / z).collect();
    let p_hp: Vec<Complex64> = zpk.poles.iter().map(|&p| half / p).collect();

    let mut zeros = split_roots(&z_hp, wo);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, wo)).take(degree));
    zeros.extend(std::iter::repeat(Complex64::new(0.0, -wo)).take(degree));

    Ok(Zpk::new(
        zeros,
        split_roots(&p_hp, wo),
        zpk.gain * neg_root_ratio(&zpk.zeros, &zpk.poles),
    ))
}

/// Map a lowpass prototype onto `band` with (already warped) edges in rad/s.
pub fn to_band(zpk: &Zpk, band: BandType, edges: &[f64]) -> FilterResult<Zpk> {
    if edges.len() != band.num_cutoffs() {
        return Err(FilterError::invalid(
            "cutoff",
            format!(
                "{:?} requires {} critical frequencies, got {}",
                band,
                band.num_cutoffs(),
                edges.len()
            ),
        ));
    }

    let out = match band {
        BandType::Lowpass => lp2lp_zpk(zpk, edges[0])?,
        BandType::Highpass => lp2hp_zpk(zpk, edges[0])?,
        BandType::Bandpass | BandType::Bandstop => {
            let bw = edges[1] - edges[0];
            let wo = (edges[0] * edges[1]).sqrt();
            if band == BandType::Bandpass {
                lp2bp_zpk(zpk, wo, bw)?
            } else {
                lp2bs_zpk(zpk, wo, bw)?
            }
        }
    };
    tracing::trace!(
        ?band,
        zeros = out.zeros.len(),
        poles = out.poles.len(),
        "frequency transform"
    );
    Ok(out)
}

/// Frequency transformation on tensor prototypes (generic over Runtime).
pub fn to_band_impl<R, C>(
    client: &C,
    proto: &AnalogPrototype<R>,
    band: BandType,
    edges: &[f64],
) -> FilterResult<AnalogPrototype<R>>
where
    R: Runtime,
    C: RuntimeClient<R>,
{
    let zpk = Zpk::from_analog(proto)?;
    Ok(to_band(&zpk, band, edges)?.to_analog(client.device()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::impl_generic::prototypes::buttap;
    use crate::filter::impl_generic::zpk::prod_map;

    fn mag(zpk: &Zpk, w: f64) -> f64 {
        let s = Complex64::new(0.0, w);
        (zpk.gain * prod_map(&zpk.zeros, |z| s - z) / prod_map(&zpk.poles, |p| s - p)).norm()
    }

    fn is_conjugate_symmetric(roots: &[Complex64]) -> bool {
        roots
            .iter()
            .all(|r| roots.iter().any(|q| (q.conj() - r).norm() < 1e-9 * r.norm().max(1.0)))
    }

    #[test]
    fn test_lp2lp_scales_cutoff() {
        let zpk = lp2lp_zpk(&buttap(4).unwrap(), 10.0).unwrap();
        assert!((mag(&zpk, 0.0) - 1.0).abs() < 1e-12);
        assert!((mag(&zpk, 10.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_lp2hp_moves_zeros_to_origin() {
        let zpk = lp2hp_zpk(&buttap(3).unwrap(), 5.0).unwrap();
        assert_eq!(zpk.zeros.len(), 3);
        assert!(zpk.zeros.iter().all(|z| z.norm() == 0.0));
        assert!((mag(&zpk, 1e6) - 1.0).abs() < 1e-9);
        assert!((mag(&zpk, 5.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_lp2bp_doubles_order() {
        let zpk = to_band(&buttap(3).unwrap(), BandType::Bandpass, &[2.0, 8.0]).unwrap();
        assert_eq!(zpk.poles.len(), 6);
        assert_eq!(zpk.zeros.len(), 3);
        assert!(is_conjugate_symmetric(&zpk.poles));
        // Unity gain at the geometric center.
        assert!((mag(&zpk, 4.0) - 1.0).abs() < 1e-12);
        assert!((mag(&zpk, 2.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_lp2bs_notch_at_center() {
        let zpk = to_band(&buttap(2).unwrap(), BandType::Bandstop, &[2.0, 8.0]).unwrap();
        assert_eq!(zpk.poles.len(), 4);
        assert_eq!(zpk.zeros.len(), 4);
        assert!(is_conjugate_symmetric(&zpk.zeros));
        assert!(mag(&zpk, 4.0) < 1e-9);
        assert!((mag(&zpk, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_count_checked() {
        assert!(to_band(&buttap(2).unwrap(), BandType::Bandpass, &[2.0]).is_err());
    }
}
