//! Digital frequency response of a transfer function.

use crate::error::{FilterError, FilterResult};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Evaluate `H(e^{jw}) = sum(b_k e^{-jwk}) / sum(a_k e^{-jwk})` at each
/// frequency in `freqs` (same units as `fs`).
pub fn freqz(b: &[f64], a: &[f64], freqs: &[f64], fs: f64) -> FilterResult<Vec<Complex64>> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(FilterError::invalid(
            "fs",
            format!("sample rate must be positive and finite, got {}", fs),
        ));
    }
    if a.is_empty() || b.is_empty() {
        return Err(FilterError::invalid("ba", "coefficient vectors must be non-empty"));
    }

    // Horner in z^-1.
    let eval = |coeffs: &[f64], zinv: Complex64| {
        coeffs
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * zinv + c)
    };

    Ok(freqs
        .iter()
        .map(|&f| {
            let zinv = Complex64::from_polar(1.0, -2.0 * PI * f / fs);
            eval(b, zinv) / eval(a, zinv)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        // (1 + z^-1)/2 is 1 at DC and 0 at Nyquist.
        let h = freqz(&[0.5, 0.5], &[1.0], &[0.0, 0.5, 1.0], 2.0).unwrap();
        assert!((h[0].norm() - 1.0).abs() < 1e-15);
        assert!((h[1].norm() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-15);
        assert!(h[2].norm() < 1e-15);
    }

    #[test]
    fn test_one_pole() {
        // 1/(1 - 0.5 z^-1) at DC is 2.
        let h = freqz(&[1.0], &[1.0, -0.5], &[0.0], 100.0).unwrap();
        assert!((h[0] - Complex64::new(2.0, 0.0)).norm() < 1e-15);
    }
}
