//! Typed filter design requests.
//!
//! A [`FilterSpec`] describes one IIR filter: family (with the parameters that
//! family requires), order, band type, critical frequencies, and domain. The
//! parameter type `P` is `f64` for a resolved design and [`DesignParam`] for a
//! batched request whose cutoff/ripple/attenuation may vary per example.
//!
//! A batched request is expanded into an ordered list of resolved specs with
//! [`FilterSpec::expand`]; every per-example sequence must share one length.

use super::types::{BandType, BesselNorm, FilterKind};
use crate::error::{FilterError, FilterResult};
use numr::dtype::DType;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A design parameter that is either shared by the batch or given per example.
///
/// A one-element sequence behaves exactly like the scalar.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DesignParam {
    /// One value for every batch element.
    Scalar(f64),
    /// One value per batch element.
    PerExample(Vec<f64>),
}

impl DesignParam {
    /// Read a parameter from a 0-D or 1-D floating point tensor.
    pub fn from_tensor<R: Runtime>(tensor: &Tensor<R>) -> FilterResult<Self> {
        if tensor.ndim() > 1 {
            return Err(FilterError::invalid(
                "param",
                format!("expected a scalar or 1-D tensor, got {}-D", tensor.ndim()),
            ));
        }
        let values: Vec<f64> = match tensor.dtype() {
            DType::F64 => tensor.contiguous().to_vec(),
            DType::F32 => {
                let data: Vec<f32> = tensor.contiguous().to_vec();
                data.into_iter().map(f64::from).collect()
            }
            other => {
                return Err(FilterError::invalid(
                    "param",
                    format!("unsupported dtype {:?}", other),
                ))
            }
        };
        if tensor.ndim() == 0 && values.len() == 1 {
            return Ok(Self::Scalar(values[0]));
        }
        Ok(Self::PerExample(values))
    }

    /// Number of examples this parameter fixes, `None` when it broadcasts.
    pub fn batch_len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::PerExample(v) if v.len() == 1 => None,
            Self::PerExample(v) => Some(v.len()),
        }
    }

    /// Value for batch element `index`, `None` past the end of a
    /// per-example sequence.
    ///
    /// Broadcasting parameters return their single value for every index.
    pub fn at(&self, index: usize) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::PerExample(v) if v.len() == 1 => Some(v[0]),
            Self::PerExample(v) => v.get(index).copied(),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::PerExample(v) if v.is_empty())
    }
}

impl From<f64> for DesignParam {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for DesignParam {
    fn from(v: Vec<f64>) -> Self {
        Self::PerExample(v)
    }
}

impl From<&[f64]> for DesignParam {
    fn from(v: &[f64]) -> Self {
        Self::PerExample(v.to_vec())
    }
}

/// IIR family together with the parameters it requires.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "ftype", rename_all = "snake_case"))]
pub enum FilterFamily<P = f64> {
    /// Maximally flat magnitude, no parameters.
    Butterworth,
    /// Passband ripple `ripple` in dB.
    Chebyshev1 { ripple: P },
    /// Minimum stopband attenuation in dB.
    Chebyshev2 { stopband_attenuation: P },
    /// Passband ripple and stopband attenuation, both in dB.
    Elliptic { ripple: P, stopband_attenuation: P },
    /// Bessel-Thomson with the chosen frequency normalization.
    Bessel {
        #[cfg_attr(feature = "serde", serde(default))]
        norm: BesselNorm,
    },
}

impl<P> FilterFamily<P> {
    /// Build a family from a loose `(kind, rp, rs)` triple.
    ///
    /// Parameters the family does not use are ignored.
    pub fn from_parts(kind: FilterKind, rp: Option<P>, rs: Option<P>) -> FilterResult<Self> {
        let missing = |parameter| FilterError::MissingParameter {
            parameter,
            family: kind.name(),
        };
        Ok(match kind {
            FilterKind::Butterworth => Self::Butterworth,
            FilterKind::Chebyshev1 => Self::Chebyshev1 {
                ripple: rp.ok_or_else(|| missing("rp"))?,
            },
            FilterKind::Chebyshev2 => Self::Chebyshev2 {
                stopband_attenuation: rs.ok_or_else(|| missing("rs"))?,
            },
            FilterKind::Elliptic => {
                let ripple = rp.ok_or_else(|| missing("rp"))?;
                let stopband_attenuation = rs.ok_or_else(|| missing("rs"))?;
                Self::Elliptic {
                    ripple,
                    stopband_attenuation,
                }
            }
            FilterKind::Bessel => Self::Bessel {
                norm: BesselNorm::default(),
            },
        })
    }

    /// Family tag without parameters.
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Butterworth => FilterKind::Butterworth,
            Self::Chebyshev1 { .. } => FilterKind::Chebyshev1,
            Self::Chebyshev2 { .. } => FilterKind::Chebyshev2,
            Self::Elliptic { .. } => FilterKind::Elliptic,
            Self::Bessel { .. } => FilterKind::Bessel,
        }
    }

    /// Named parameters carried by this family.
    pub fn params(&self) -> Vec<(&'static str, &P)> {
        match self {
            Self::Butterworth | Self::Bessel { .. } => Vec::new(),
            Self::Chebyshev1 { ripple } => vec![("rp", ripple)],
            Self::Chebyshev2 {
                stopband_attenuation,
            } => vec![("rs", stopband_attenuation)],
            Self::Elliptic {
                ripple,
                stopband_attenuation,
            } => vec![("rp", ripple), ("rs", stopband_attenuation)],
        }
    }

    /// Map every parameter through `f`.
    pub fn map<Q>(&self, f: impl Fn(&P) -> Q) -> FilterFamily<Q> {
        match self {
            Self::Butterworth => FilterFamily::Butterworth,
            Self::Chebyshev1 { ripple } => FilterFamily::Chebyshev1 { ripple: f(ripple) },
            Self::Chebyshev2 {
                stopband_attenuation,
            } => FilterFamily::Chebyshev2 {
                stopband_attenuation: f(stopband_attenuation),
            },
            Self::Elliptic {
                ripple,
                stopband_attenuation,
            } => FilterFamily::Elliptic {
                ripple: f(ripple),
                stopband_attenuation: f(stopband_attenuation),
            },
            Self::Bessel { norm } => FilterFamily::Bessel { norm: *norm },
        }
    }

    /// Fallible [`map`](Self::map); `f` also receives the parameter name.
    pub fn try_map<Q>(
        &self,
        f: impl Fn(&'static str, &P) -> FilterResult<Q>,
    ) -> FilterResult<FilterFamily<Q>> {
        Ok(match self {
            Self::Butterworth => FilterFamily::Butterworth,
            Self::Chebyshev1 { ripple } => FilterFamily::Chebyshev1 {
                ripple: f("rp", ripple)?,
            },
            Self::Chebyshev2 {
                stopband_attenuation,
            } => FilterFamily::Chebyshev2 {
                stopband_attenuation: f("rs", stopband_attenuation)?,
            },
            Self::Elliptic {
                ripple,
                stopband_attenuation,
            } => FilterFamily::Elliptic {
                ripple: f("rp", ripple)?,
                stopband_attenuation: f("rs", stopband_attenuation)?,
            },
            Self::Bessel { norm } => FilterFamily::Bessel { norm: *norm },
        })
    }
}

impl FilterFamily<f64> {
    fn validate(&self) -> FilterResult<()> {
        for (name, value) in self.params() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(FilterError::invalid(
                    name,
                    format!("{} must be positive and finite, got {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Critical frequency or frequencies.
///
/// Units are Hz for digital designs and rad/s for analog designs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Cutoff<P = f64> {
    /// Lowpass or highpass edge.
    Single(P),
    /// `(low, high)` band edges.
    Band(P, P),
}

impl<P> Cutoff<P> {
    /// Map every frequency through `f`.
    pub fn map<Q>(&self, f: impl Fn(&P) -> Q) -> Cutoff<Q> {
        match self {
            Self::Single(w) => Cutoff::Single(f(w)),
            Self::Band(lo, hi) => Cutoff::Band(f(lo), f(hi)),
        }
    }

    fn try_map<Q>(&self, f: impl Fn(&P) -> FilterResult<Q>) -> FilterResult<Cutoff<Q>> {
        Ok(match self {
            Self::Single(w) => Cutoff::Single(f(w)?),
            Self::Band(lo, hi) => Cutoff::Band(f(lo)?, f(hi)?),
        })
    }

    fn values(&self) -> Vec<&P> {
        match self {
            Self::Single(w) => vec![w],
            Self::Band(lo, hi) => vec![lo, hi],
        }
    }
}

impl Cutoff<f64> {
    /// Critical frequencies as a slice-like vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values().into_iter().copied().collect()
    }
}

/// Whether the design targets an analog or a digital filter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Domain {
    /// Analog filter, critical frequencies in rad/s.
    Analog,
    /// Digital filter, critical frequencies in the units of `sample_rate`.
    Digital { sample_rate: f64 },
}

impl Default for Domain {
    /// Sample rate 2 makes cutoffs fractions of Nyquist.
    fn default() -> Self {
        Domain::Digital { sample_rate: 2.0 }
    }
}

impl Domain {
    /// `true` for analog designs.
    pub fn is_analog(&self) -> bool {
        matches!(self, Domain::Analog)
    }

    /// Sample rate of a digital design.
    pub fn sample_rate(&self) -> Option<f64> {
        match self {
            Domain::Analog => None,
            Domain::Digital { sample_rate } => Some(*sample_rate),
        }
    }
}

/// Complete description of a requested IIR filter.
///
/// # Example
///
/// ```
/// use batch_iir::filter::{FilterFamily, FilterSpec};
///
/// let spec = FilterSpec::<f64>::lowpass(4, 100.0)
///     .with_family(FilterFamily::Chebyshev1 { ripple: 0.5 })
///     .digital(1024.0);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterSpec<P = f64> {
    /// Filter order (number of prototype poles).
    pub order: usize,
    /// Family and its parameters.
    pub family: FilterFamily<P>,
    /// Band type.
    pub band: BandType,
    /// Critical frequencies.
    pub cutoff: Cutoff<P>,
    /// Analog or digital at a given sample rate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub domain: Domain,
}

impl<P> FilterSpec<P> {
    fn with_band(order: usize, band: BandType, cutoff: Cutoff<P>) -> Self {
        Self {
            order,
            family: FilterFamily::Butterworth,
            band,
            cutoff,
            domain: Domain::default(),
        }
    }

    /// Butterworth lowpass with the given edge; change the family with
    /// [`with_family`](Self::with_family).
    pub fn lowpass(order: usize, cutoff: impl Into<P>) -> Self {
        Self::with_band(order, BandType::Lowpass, Cutoff::Single(cutoff.into()))
    }

    /// Butterworth highpass with the given edge.
    pub fn highpass(order: usize, cutoff: impl Into<P>) -> Self {
        Self::with_band(order, BandType::Highpass, Cutoff::Single(cutoff.into()))
    }

    /// Butterworth bandpass between `low` and `high`.
    pub fn bandpass(order: usize, low: impl Into<P>, high: impl Into<P>) -> Self {
        Self::with_band(
            order,
            BandType::Bandpass,
            Cutoff::Band(low.into(), high.into()),
        )
    }

    /// Butterworth bandstop between `low` and `high`.
    pub fn bandstop(order: usize, low: impl Into<P>, high: impl Into<P>) -> Self {
        Self::with_band(
            order,
            BandType::Bandstop,
            Cutoff::Band(low.into(), high.into()),
        )
    }

    /// Replace the filter family.
    pub fn with_family(mut self, family: FilterFamily<P>) -> Self {
        self.family = family;
        self
    }

    /// Design a digital filter sampled at `sample_rate`.
    pub fn digital(mut self, sample_rate: f64) -> Self {
        self.domain = Domain::Digital { sample_rate };
        self
    }

    /// Design an analog filter.
    pub fn analog(mut self) -> Self {
        self.domain = Domain::Analog;
        self
    }

    /// Map every design parameter through `f`.
    pub fn map<Q>(&self, f: impl Fn(&P) -> Q) -> FilterSpec<Q> {
        FilterSpec {
            order: self.order,
            family: self.family.map(&f),
            band: self.band,
            cutoff: self.cutoff.map(&f),
            domain: self.domain,
        }
    }

    /// Fallible [`map`](Self::map); `f` also receives the parameter name.
    pub fn try_map<Q>(
        &self,
        f: impl Fn(&'static str, &P) -> FilterResult<Q>,
    ) -> FilterResult<FilterSpec<Q>> {
        Ok(FilterSpec {
            order: self.order,
            family: self.family.try_map(&f)?,
            band: self.band,
            cutoff: self.cutoff.try_map(|w| f("cutoff", w))?,
            domain: self.domain,
        })
    }
}

impl FilterSpec<f64> {
    /// Check every invariant of a resolved design request.
    pub fn validate(&self) -> FilterResult<()> {
        if self.order < 1 {
            return Err(FilterError::InvalidOrder { order: self.order });
        }

        let cutoffs = self.cutoff.to_vec();
        if cutoffs.len() != self.band.num_cutoffs() {
            return Err(FilterError::invalid(
                "cutoff",
                format!(
                    "{:?} requires {} critical frequencies, got {}",
                    self.band,
                    self.band.num_cutoffs(),
                    cutoffs.len()
                ),
            ));
        }
        if let Some(&w) = cutoffs.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(FilterError::invalid(
                "cutoff",
                format!("critical frequencies must be positive and finite, got {}", w),
            ));
        }
        if cutoffs.len() == 2 && cutoffs[0] >= cutoffs[1] {
            return Err(FilterError::invalid(
                "cutoff",
                format!(
                    "band edges must be strictly increasing, got [{}, {}]",
                    cutoffs[0], cutoffs[1]
                ),
            ));
        }

        if let Domain::Digital { sample_rate } = self.domain {
            if !(sample_rate.is_finite() && sample_rate > 0.0) {
                return Err(FilterError::invalid(
                    "fs",
                    format!("sample rate must be positive and finite, got {}", sample_rate),
                ));
            }
            let nyquist = sample_rate / 2.0;
            if let Some(&w) = cutoffs.iter().find(|w| **w >= nyquist) {
                return Err(FilterError::invalid(
                    "cutoff",
                    format!(
                        "digital critical frequency {} must be below Nyquist ({})",
                        w, nyquist
                    ),
                ));
            }
        }

        self.family.validate()
    }
}

impl FilterSpec<DesignParam> {
    /// Number of per-example designs this request expands to, `None` when
    /// every parameter broadcasts.
    ///
    /// All per-example sequences must share one length.
    pub fn batch_size(&self) -> FilterResult<Option<usize>> {
        let named = self
            .cutoff
            .values()
            .into_iter()
            .map(|p| ("cutoff", p))
            .chain(self.family.params());

        let mut batch: Option<(usize, &'static str)> = None;
        for (name, param) in named {
            if param.is_empty() {
                return Err(FilterError::invalid(name, "per-example sequence is empty"));
            }
            let Some(len) = param.batch_len() else {
                continue;
            };
            match batch {
                None => batch = Some((len, name)),
                Some((expected, first)) if expected != len => {
                    return Err(FilterError::BatchSizeMismatch {
                        expected,
                        actual: len,
                        context: format!("'{}' disagrees with '{}'", name, first),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(batch.map(|(len, _)| len))
    }

    /// Resolve the spec for batch element `index`.
    pub fn resolve(&self, index: usize) -> FilterResult<FilterSpec<f64>> {
        self.try_map(|name, p| {
            p.at(index).ok_or_else(|| {
                FilterError::invalid(name, format!("no value for batch element {}", index))
            })
        })
    }

    /// Expand into one resolved spec per batch element (a single spec when
    /// every parameter broadcasts).
    pub fn expand(&self) -> FilterResult<Vec<FilterSpec<f64>>> {
        let n = self.batch_size()?.unwrap_or(1);
        (0..n).map(|i| self.resolve(i)).collect()
    }
}

impl From<FilterSpec<f64>> for FilterSpec<DesignParam> {
    fn from(spec: FilterSpec<f64>) -> Self {
        spec.map(|&v| DesignParam::Scalar(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_parameters() {
        let err = FilterFamily::<f64>::from_parts(FilterKind::Chebyshev1, None, Some(20.0))
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::MissingParameter {
                parameter: "rp",
                family: "Chebyshev Type I"
            }
        );

        let err =
            FilterFamily::<f64>::from_parts(FilterKind::Elliptic, Some(0.5), None).unwrap_err();
        assert!(matches!(
            err,
            FilterError::MissingParameter { parameter: "rs", .. }
        ));

        let fam = FilterFamily::from_parts(FilterKind::Butterworth, Some(1.0), None).unwrap();
        assert_eq!(fam, FilterFamily::Butterworth);
    }

    #[test]
    fn test_validate_rejects_bad_specs() {
        assert_eq!(
            FilterSpec::<f64>::lowpass(0, 10.0).digital(100.0).validate(),
            Err(FilterError::InvalidOrder { order: 0 })
        );
        assert!(FilterSpec::<f64>::lowpass(2, 60.0)
            .digital(100.0)
            .validate()
            .is_err());
        assert!(FilterSpec::<f64>::bandpass(2, 20.0, 10.0)
            .digital(100.0)
            .validate()
            .is_err());
        assert!(FilterSpec::<f64>::lowpass(2, -1.0).analog().validate().is_err());
        assert!(FilterSpec::<f64>::lowpass(2, 10.0)
            .with_family(FilterFamily::Chebyshev1 { ripple: 0.0 })
            .validate()
            .is_err());
        // Analog cutoffs have no Nyquist limit.
        assert!(FilterSpec::<f64>::lowpass(2, 1000.0).analog().validate().is_ok());
    }

    #[test]
    fn test_batch_expansion() {
        let spec = FilterSpec::<DesignParam>::lowpass(4, vec![10.0, 20.0, 30.0])
            .with_family(FilterFamily::Chebyshev1 {
                ripple: DesignParam::Scalar(0.5),
            })
            .digital(256.0);
        assert_eq!(spec.batch_size().unwrap(), Some(3));

        let specs = spec.expand().unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[1].cutoff, Cutoff::Single(20.0));
        assert_eq!(specs[2].family, FilterFamily::Chebyshev1 { ripple: 0.5 });
    }

    #[test]
    fn test_single_element_broadcasts() {
        let spec = FilterSpec::<DesignParam>::lowpass(4, vec![10.0]).digital(256.0);
        assert_eq!(spec.batch_size().unwrap(), None);
        assert_eq!(spec.expand().unwrap().len(), 1);
    }

    #[test]
    fn test_param_index_past_end() {
        let param = DesignParam::PerExample(vec![10.0, 20.0]);
        assert_eq!(param.at(1), Some(20.0));
        assert_eq!(param.at(2), None);
        assert_eq!(DesignParam::Scalar(5.0).at(7), Some(5.0));
        assert_eq!(DesignParam::PerExample(vec![3.0]).at(7), Some(3.0));

        let spec = FilterSpec::<DesignParam>::lowpass(4, vec![10.0, 20.0])
            .with_family(FilterFamily::Chebyshev1 {
                ripple: DesignParam::Scalar(0.5),
            })
            .digital(256.0);
        assert_eq!(spec.resolve(1).unwrap().cutoff, Cutoff::Single(20.0));
        assert!(matches!(
            spec.resolve(2),
            Err(FilterError::InvalidParameter { ref parameter, .. }) if parameter == "cutoff"
        ));
    }

    #[test]
    fn test_batch_mismatch() {
        let spec = FilterSpec::<DesignParam>::lowpass(4, vec![10.0, 20.0, 30.0])
            .with_family(FilterFamily::Elliptic {
                ripple: DesignParam::PerExample(vec![0.5, 1.0]),
                stopband_attenuation: DesignParam::Scalar(40.0),
            });
        assert!(matches!(
            spec.batch_size(),
            Err(FilterError::BatchSizeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }
}
