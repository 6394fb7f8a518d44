//! Generic implementation of batched IIR filter design.
//!
//! A request is expanded into one resolved [`FilterSpec`] per batch element,
//! each spec runs through prototype → frequency transform → bilinear map →
//! stability check, and the results are stacked in request order.

// Allow many arguments for filter design functions that match scipy's signature
#![allow(clippy::too_many_arguments)]

use super::bilinear::{bilinear_zpk, prewarp};
use super::conversions::{check_stability, zpk2tf};
use super::freq_transform::to_band;
use super::prototypes::analog_prototype;
use super::zpk::Zpk;
use crate::error::{FilterError, FilterResult};
use crate::filter::spec::{Cutoff, DesignParam, Domain, FilterFamily, FilterSpec};
use crate::filter::traits::iir_design::IirDesignResult;
use crate::filter::types::{BandType, FilterKind, FilterOutput, TransferFunction};
use numr::algorithm::polynomial::PolynomialAlgorithms;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sample rate the digital pipeline works at after normalizing by Nyquist.
const INTERNAL_FS: f64 = 2.0;

/// Design a single resolved filter, returning its zeros, poles, and gain.
///
/// Digital edges are normalized to Nyquist (`Wn = 2f/fs`), pre-warped, and
/// mapped through the bilinear transform at an internal sample rate of 2.
/// Analog edges are used as given (rad/s).
pub fn design_one<R, C>(client: &C, spec: &FilterSpec<f64>) -> FilterResult<Zpk>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    spec.validate()?;

    let proto = analog_prototype(client, &spec.family, spec.order)?;
    let zpk = match spec.domain {
        Domain::Analog => to_band(&proto, spec.band, &spec.cutoff.to_vec())?,
        Domain::Digital { sample_rate } => {
            let warped: Vec<f64> = spec
                .cutoff
                .to_vec()
                .into_iter()
                .map(|f| prewarp(2.0 * f / sample_rate, INTERNAL_FS))
                .collect();
            let analog = to_band(&proto, spec.band, &warped)?;
            bilinear_zpk(&analog, INTERNAL_FS)?
        }
    };

    check_stability(&zpk, &spec.domain)?;
    Ok(zpk)
}

fn design_all<R, C>(client: &C, specs: &[FilterSpec<f64>]) -> FilterResult<Vec<Zpk>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    #[cfg(feature = "parallel")]
    {
        specs.par_iter().map(|spec| design_one(client, spec)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        specs.iter().map(|spec| design_one(client, spec)).collect()
    }
}

/// Stack per-example coefficient vectors into `[n]` or `[batch, n]`.
fn stack_rows<R: Runtime>(
    rows: &[Vec<f64>],
    batched: bool,
    device: &R::Device,
) -> FilterResult<Tensor<R>> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some(row) = rows.iter().find(|r| r.len() != width) {
        return Err(FilterError::DesignError {
            context: format!(
                "per-example designs disagree in length ({} vs {})",
                width,
                row.len()
            ),
        });
    }
    let data: Vec<f64> = rows.concat();
    if batched {
        Ok(Tensor::<R>::from_slice(&data, &[rows.len(), width], device))
    } else {
        Ok(Tensor::<R>::from_slice(&data, &[width], device))
    }
}

/// Design a (possibly per-example) IIR filter request.
///
/// A request whose parameters all broadcast produces coefficients of shape
/// `[n]`; otherwise `b` and `a` have shape `[batch, n]`, one row per example.
pub fn design_impl<R, C>(
    client: &C,
    spec: &FilterSpec<DesignParam>,
    output: FilterOutput,
) -> FilterResult<IirDesignResult<R>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    let batch = spec.batch_size()?;
    let specs = spec.expand()?;
    tracing::debug!(
        family = %spec.family.kind(),
        order = spec.order,
        band = ?spec.band,
        analog = spec.domain.is_analog(),
        batch = specs.len(),
        "designing IIR filter"
    );

    let designs = design_all(client, &specs)?;
    let device = client.device();

    match output {
        FilterOutput::Ba => {
            let (bs, as_): (Vec<_>, Vec<_>) = designs
                .iter()
                .map(|zpk| zpk2tf(client, zpk))
                .collect::<FilterResult<Vec<_>>>()?
                .into_iter()
                .unzip();
            let batched = batch.is_some();
            Ok(IirDesignResult::Ba(TransferFunction::new(
                stack_rows(&bs, batched, device)?,
                stack_rows(&as_, batched, device)?,
            )))
        }
        FilterOutput::Zpk => Ok(IirDesignResult::Zpk(
            designs.iter().map(|z| z.to_digital(device)).collect(),
        )),
    }
}

/// SciPy-style `iirfilter` over loose arguments.
///
/// `cutoff` holds one entry for lowpass/highpass and two for
/// bandpass/bandstop; each entry may be a scalar or a per-example sequence.
/// A digital filter without `fs` uses the Nyquist-normalized convention
/// (`fs = 2`, cutoffs in `(0, 1)`).
pub fn iirfilter_impl<R, C>(
    client: &C,
    order: usize,
    cutoff: &[DesignParam],
    kind: FilterKind,
    band: BandType,
    analog: bool,
    fs: Option<f64>,
    rp: Option<DesignParam>,
    rs: Option<DesignParam>,
    output: FilterOutput,
) -> FilterResult<IirDesignResult<R>>
where
    R: Runtime,
    C: PolynomialAlgorithms<R> + RuntimeClient<R>,
{
    let cutoff = match cutoff {
        [w] => Cutoff::Single(w.clone()),
        [lo, hi] => Cutoff::Band(lo.clone(), hi.clone()),
        _ => {
            return Err(FilterError::invalid(
                "cutoff",
                format!("expected 1 or 2 critical frequencies, got {}", cutoff.len()),
            ))
        }
    };

    let domain = match (analog, fs) {
        (true, Some(_)) => {
            return Err(FilterError::invalid(
                "fs",
                "sample rate cannot be specified for an analog filter",
            ))
        }
        (true, None) => Domain::Analog,
        (false, Some(sample_rate)) => Domain::Digital { sample_rate },
        (false, None) => Domain::default(),
    };

    let spec = FilterSpec {
        order,
        family: FilterFamily::from_parts(kind, rp, rs)?,
        band,
        cutoff,
        domain,
    };
    design_impl(client, &spec, output)
}
