//! CPU-only implementations of IIR filter application algorithms.
//!
//! IIR filters are inherently sequential: each output depends on the previous
//! outputs through the recursion
//!
//! ```text
//! y[n] = b[0]*x[n] + b[1]*x[n-1] + ... - a[1]*y[n-1] - a[2]*y[n-2] - ...
//! ```
//!
//! so a single signal cannot be parallelized. Rows of a batch are independent,
//! and with the `parallel` feature they are filtered on the rayon pool. Every
//! row runs the same sequential code, so identical rows produce identical
//! output regardless of batch size or position.

use crate::error::{FilterError, FilterResult};
use crate::filter::impl_generic::{f64_to_tensor, tensor_rows};
use crate::filter::traits::filter_apply::{FilterApplicationAlgorithms, LfilterResult, PadType};
use crate::filter::types::TransferFunction;
use numr::algorithm::linalg::LinearAlgebraAlgorithms;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::runtime::RuntimeClient;
use numr::tensor::Tensor;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Trait Implementation
// ============================================================================

impl FilterApplicationAlgorithms<CpuRuntime> for CpuClient {
    fn lfilter(
        &self,
        b: &Tensor<CpuRuntime>,
        a: &Tensor<CpuRuntime>,
        x: &Tensor<CpuRuntime>,
        zi: Option<&Tensor<CpuRuntime>>,
    ) -> FilterResult<LfilterResult<CpuRuntime>> {
        lfilter_impl(b, a, x, zi)
    }

    fn lfilter_zi(
        &self,
        b: &Tensor<CpuRuntime>,
        a: &Tensor<CpuRuntime>,
    ) -> FilterResult<Tensor<CpuRuntime>> {
        lfilter_zi_impl(self, b, a)
    }

    fn filtfilt(
        &self,
        tf: &TransferFunction<CpuRuntime>,
        x: &Tensor<CpuRuntime>,
        padtype: Option<PadType>,
        padlen: Option<usize>,
    ) -> FilterResult<Tensor<CpuRuntime>> {
        filtfilt_impl(self, tf, x, padtype, padlen)
    }
}

// ============================================================================
// Coefficients
// ============================================================================

/// One coefficient set, normalized by `a[0]` and zero-padded to equal length.
#[derive(Debug, Clone)]
struct Coefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl Coefficients {
    fn new(b: &[f64], a: &[f64]) -> FilterResult<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(FilterError::invalid(
                "b/a",
                "filter coefficients cannot be empty",
            ));
        }
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(FilterError::invalid(
                "a",
                format!("leading denominator coefficient must be nonzero, got {}", a0),
            ));
        }

        let n = b.len().max(a.len());
        let mut b_pad = vec![0.0; n];
        let mut a_pad = vec![0.0; n];
        for (dst, &v) in b_pad.iter_mut().zip(b) {
            *dst = v / a0;
        }
        for (dst, &v) in a_pad.iter_mut().zip(a) {
            *dst = v / a0;
        }
        Ok(Self { b: b_pad, a: a_pad })
    }

    fn state_len(&self) -> usize {
        self.b.len() - 1
    }
}

/// Read `b`, `a` tensors into coefficient sets (one shared or one per row).
fn coefficient_sets(
    b: &Tensor<CpuRuntime>,
    a: &Tensor<CpuRuntime>,
) -> FilterResult<Vec<Coefficients>> {
    let b_rows = tensor_rows(b, "b")?;
    let a_rows = tensor_rows(a, "a")?;
    let sets = match (b_rows.len(), a_rows.len()) {
        (nb, na) if nb == na => b_rows
            .iter()
            .zip(&a_rows)
            .map(|(b, a)| Coefficients::new(b, a))
            .collect::<FilterResult<Vec<_>>>()?,
        (1, _) => a_rows
            .iter()
            .map(|a| Coefficients::new(&b_rows[0], a))
            .collect::<FilterResult<Vec<_>>>()?,
        (_, 1) => b_rows
            .iter()
            .map(|b| Coefficients::new(b, &a_rows[0]))
            .collect::<FilterResult<Vec<_>>>()?,
        (nb, na) => {
            return Err(FilterError::BatchSizeMismatch {
                expected: nb,
                actual: na,
                context: "denominator coefficient sets vs numerator coefficient sets".to_string(),
            })
        }
    };
    if sets.is_empty() {
        return Err(FilterError::invalid("b/a", "at least one coefficient set is required"));
    }
    Ok(sets)
}

/// Pair coefficient sets with `rows` signal rows.
fn check_pairing(sets: usize, rows: usize) -> FilterResult<()> {
    if sets != 1 && sets != rows {
        return Err(FilterError::BatchSizeMismatch {
            expected: rows,
            actual: sets,
            context: "coefficient sets vs signal batch".to_string(),
        });
    }
    Ok(())
}

fn pick<T>(items: &[T], row: usize) -> &T {
    if items.len() == 1 {
        &items[0]
    } else {
        &items[row]
    }
}

// ============================================================================
// Sequential kernels
// ============================================================================

/// Direct Form II transposed over one row, updating `z` in place.
fn lfilter_row(c: &Coefficients, x: &[f64], z: &mut [f64]) -> Vec<f64> {
    let (b, a) = (&c.b, &c.a);
    let n = b.len();
    let mut y = Vec::with_capacity(x.len());

    if n == 1 {
        y.extend(x.iter().map(|&xn| b[0] * xn));
        return y;
    }

    for &xn in x {
        let yn = z[0] + b[0] * xn;
        for i in 0..n - 2 {
            z[i] = z[i + 1] + xn * b[i + 1] - yn * a[i + 1];
        }
        z[n - 2] = xn * b[n - 1] - yn * a[n - 1];
        y.push(yn);
    }
    y
}

/// Step-response steady state of one coefficient set.
///
/// Solves `(I - companion(a)^T) zi = b[1:] - a[1:] * b[0]`.
fn steady_state(client: &CpuClient, c: &Coefficients) -> FilterResult<Vec<f64>> {
    let m = c.state_len();
    if m == 0 {
        return Ok(Vec::new());
    }

    let mut lhs = vec![0.0; m * m];
    for i in 0..m {
        lhs[i * m + i] += 1.0;
        lhs[i * m] += c.a[i + 1];
        if i + 1 < m {
            lhs[i * m + i + 1] -= 1.0;
        }
    }
    let rhs: Vec<f64> = (1..=m).map(|i| c.b[i] - c.a[i] * c.b[0]).collect();

    let device = client.device();
    let lhs = Tensor::<CpuRuntime>::from_slice(&lhs, &[m, m], device);
    let rhs = Tensor::<CpuRuntime>::from_slice(&rhs, &[m, 1], device);
    let singular = |detail: String| FilterError::NumericalInstability {
        context: format!("steady-state system is singular (pole at z = 1): {}", detail),
    };

    let zi: Vec<f64> = LinearAlgebraAlgorithms::solve(client, &lhs, &rhs)
        .map_err(|e| singular(e.to_string()))?
        .contiguous()
        .to_vec();
    if zi.iter().any(|v| !v.is_finite()) {
        return Err(singular("non-finite solution".to_string()));
    }
    Ok(zi)
}

/// Extend `x` by `edge` samples at both ends.
fn extend(x: &[f64], padtype: PadType, edge: usize) -> Vec<f64> {
    let n = x.len();
    if edge == 0 {
        return x.to_vec();
    }

    let (first, last) = (x[0], x[n - 1]);
    let mut out = Vec::with_capacity(n + 2 * edge);
    match padtype {
        PadType::None => return x.to_vec(),
        PadType::Odd => {
            out.extend((1..=edge).rev().map(|i| 2.0 * first - x[i]));
            out.extend_from_slice(x);
            out.extend((1..=edge).map(|i| 2.0 * last - x[n - 1 - i]));
        }
        PadType::Even => {
            out.extend((1..=edge).rev().map(|i| x[i]));
            out.extend_from_slice(x);
            out.extend((1..=edge).map(|i| x[n - 1 - i]));
        }
        PadType::Constant => {
            out.extend(std::iter::repeat(first).take(edge));
            out.extend_from_slice(x);
            out.extend(std::iter::repeat(last).take(edge));
        }
    }
    out
}

/// Forward-backward filter one row.
fn filtfilt_row(
    c: &Coefficients,
    zi: &[f64],
    x: &[f64],
    padtype: PadType,
    edge: usize,
) -> Vec<f64> {
    let ext = extend(x, padtype, edge);

    let mut z: Vec<f64> = zi.iter().map(|&v| v * ext[0]).collect();
    let forward = lfilter_row(c, &ext, &mut z);

    let y0 = forward[forward.len() - 1];
    let reversed: Vec<f64> = forward.into_iter().rev().collect();
    let mut z: Vec<f64> = zi.iter().map(|&v| v * y0).collect();
    let backward = lfilter_row(c, &reversed, &mut z);

    backward.into_iter().rev().skip(edge).take(x.len()).collect()
}

/// Run `f` over every row index, on the rayon pool when enabled.
fn map_rows<T, F>(rows: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..rows).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..rows).map(f).collect()
    }
}

// ============================================================================
// Implementation Functions (CPU-only, not generic)
// ============================================================================

/// Apply an IIR filter row by row using Direct Form II transposed.
fn lfilter_impl(
    b: &Tensor<CpuRuntime>,
    a: &Tensor<CpuRuntime>,
    x: &Tensor<CpuRuntime>,
    zi: Option<&Tensor<CpuRuntime>>,
) -> FilterResult<LfilterResult<CpuRuntime>> {
    let sets = coefficient_sets(b, a)?;
    let rows = tensor_rows(x, "x")?;
    check_pairing(sets.len(), rows.len())?;
    let state_len = sets[0].state_len();

    let states = match zi {
        Some(zi) => {
            let zi_rows = tensor_rows(zi, "zi")?;
            if let Some(bad) = zi_rows.iter().find(|r| r.len() != state_len) {
                return Err(FilterError::invalid(
                    "zi",
                    format!("initial state must have length {}, got {}", state_len, bad.len()),
                ));
            }
            if zi_rows.len() != 1 && zi_rows.len() != rows.len() {
                return Err(FilterError::BatchSizeMismatch {
                    expected: rows.len(),
                    actual: zi_rows.len(),
                    context: "initial states vs signal batch".to_string(),
                });
            }
            zi_rows
        }
        None => vec![vec![0.0; state_len]],
    };

    let results = map_rows(rows.len(), |r| {
        let mut z = pick(&states, r).clone();
        let y = lfilter_row(pick(&sets, r), &rows[r], &mut z);
        (y, z)
    });

    let device = x.device();
    let dtype = x.dtype();
    let (y, zf): (Vec<Vec<f64>>, Vec<Vec<f64>>) = results.into_iter().unzip();
    let zf_shape = if x.ndim() == 1 {
        vec![state_len]
    } else {
        vec![rows.len(), state_len]
    };

    Ok(LfilterResult {
        y: f64_to_tensor(&y.concat(), x.shape(), dtype, device)?,
        zf: f64_to_tensor(&zf.concat(), &zf_shape, dtype, device)?,
    })
}

/// Steady-state initial conditions, `[state]` or `[batch, state]`.
fn lfilter_zi_impl(
    client: &CpuClient,
    b: &Tensor<CpuRuntime>,
    a: &Tensor<CpuRuntime>,
) -> FilterResult<Tensor<CpuRuntime>> {
    let sets = coefficient_sets(b, a)?;
    let zi = sets
        .iter()
        .map(|c| steady_state(client, c))
        .collect::<FilterResult<Vec<_>>>()?;

    let state_len = sets[0].state_len();
    let shape = if b.ndim() == 1 && a.ndim() == 1 {
        vec![state_len]
    } else {
        vec![sets.len(), state_len]
    };
    f64_to_tensor(&zi.concat(), &shape, b.dtype(), b.device())
}

/// Zero-phase digital filtering (forward-backward).
fn filtfilt_impl(
    client: &CpuClient,
    tf: &TransferFunction<CpuRuntime>,
    x: &Tensor<CpuRuntime>,
    padtype: Option<PadType>,
    padlen: Option<usize>,
) -> FilterResult<Tensor<CpuRuntime>> {
    let padtype = padtype.unwrap_or_default();
    let sets = coefficient_sets(&tf.b, &tf.a)?;
    let rows = tensor_rows(x, "x")?;
    check_pairing(sets.len(), rows.len())?;

    let ntaps = tf.num_b().max(tf.num_a());
    let edge = match padtype {
        PadType::None => 0,
        _ => padlen.unwrap_or(3 * ntaps),
    };
    let length = x.shape().last().copied().unwrap_or(0);
    if length <= edge {
        return Err(FilterError::SignalTooShort {
            length,
            required: edge,
        });
    }

    tracing::debug!(
        batch = rows.len(),
        length,
        padlen = edge,
        ?padtype,
        coefficient_sets = sets.len(),
        "zero-phase filtering"
    );

    let zi = sets
        .iter()
        .map(|c| steady_state(client, c))
        .collect::<FilterResult<Vec<_>>>()?;

    let y = map_rows(rows.len(), |r| {
        filtfilt_row(pick(&sets, r), pick::<Vec<f64>>(&zi, r), &rows[r], padtype, edge)
    });

    f64_to_tensor(&y.concat(), x.shape(), x.dtype(), x.device())
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn coeffs(b: &[f64], a: &[f64]) -> Coefficients {
        Coefficients::new(b, a).unwrap()
    }

    #[test]
    fn test_lfilter_row_matches_difference_equation() {
        let c = coeffs(&[0.2, 0.3], &[1.0, -0.5]);
        let x = [1.0, 0.0, 0.0, 2.0, -1.0];
        let mut z = vec![0.0];
        let y = lfilter_row(&c, &x, &mut z);

        // y[n] = 0.2 x[n] + 0.3 x[n-1] + 0.5 y[n-1]
        let mut expected = Vec::new();
        let (mut xp, mut yp) = (0.0, 0.0);
        for &xn in &x {
            let yn = 0.2 * xn + 0.3 * xp + 0.5 * yp;
            expected.push(yn);
            xp = xn;
            yp = yn;
        }
        for (got, want) in y.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-15);
        }
    }

    #[test]
    fn test_normalizes_by_a0() {
        let c = coeffs(&[2.0, 4.0], &[2.0]);
        assert_eq!(c.b, vec![1.0, 2.0]);
        assert_eq!(c.a, vec![1.0, 0.0]);
        assert!(Coefficients::new(&[1.0], &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_steady_state_removes_step_transient() {
        let (client, _device) = setup();
        let c = coeffs(
            &[0.292_893_218_813_452_5, 0.585_786_437_626_905, 0.292_893_218_813_452_5],
            &[1.0, 0.0, 0.171_572_875_253_809_9],
        );
        let zi = steady_state(&client, &c).unwrap();
        let mut z: Vec<f64> = zi.iter().map(|v| v * 3.0).collect();
        let y = lfilter_row(&c, &[3.0; 20], &mut z);
        for v in y {
            assert!((v - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_steady_state_third_order() {
        // Poles at 0.5 and +-0.5j.
        let (client, _device) = setup();
        let c = coeffs(&[0.1, 0.2, 0.3, 0.4], &[1.0, -0.5, 0.25, -0.125]);
        let zi = steady_state(&client, &c).unwrap();
        let dc = c.b.iter().sum::<f64>() / c.a.iter().sum::<f64>();
        let mut z = zi.clone();
        let y = lfilter_row(&c, &[1.0; 8], &mut z);
        for v in y {
            assert!((v - dc).abs() < 1e-12);
        }
    }

    #[test]
    fn test_steady_state_pole_at_one_is_singular() {
        let (client, _device) = setup();
        let c = coeffs(&[1.0], &[1.0, -1.0]);
        assert!(matches!(
            steady_state(&client, &c),
            Err(FilterError::NumericalInstability { .. })
        ));
    }

    #[test]
    fn test_extensions() {
        let x = [1.0, 2.0, 4.0, 7.0];
        assert_eq!(
            extend(&x, PadType::Odd, 2),
            vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]
        );
        assert_eq!(
            extend(&x, PadType::Even, 2),
            vec![4.0, 2.0, 1.0, 2.0, 4.0, 7.0, 4.0, 2.0]
        );
        assert_eq!(
            extend(&x, PadType::Constant, 1),
            vec![1.0, 1.0, 2.0, 4.0, 7.0, 7.0]
        );
        assert_eq!(extend(&x, PadType::None, 3), x.to_vec());
    }
}
