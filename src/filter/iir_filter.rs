//! Reusable batched IIR filter.

use super::spec::{DesignParam, FilterSpec};
use super::traits::{FilterApplicationAlgorithms, IirDesignAlgorithms, PadType};
use super::types::{FilterOutput, TransferFunction};
use crate::error::{FilterError, FilterResult};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// A designed IIR filter that applies zero-phase filtering to signal batches.
///
/// Coefficients are fixed at construction; either one set shared by every
/// row, or one set per row when the design parameters were per example.
///
/// # Example
///
/// ```
/// use batch_iir::filter::{DesignParam, FilterFamily, FilterSpec, IirFilter};
/// use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
/// use numr::tensor::Tensor;
/// # let device = CpuDevice::new();
/// # let client = CpuClient::new(device.clone());
///
/// let spec = FilterSpec::<DesignParam>::lowpass(4, 100.0)
///     .with_family(FilterFamily::Chebyshev1 {
///         ripple: DesignParam::Scalar(0.5),
///     })
///     .digital(1024.0);
/// let filter = IirFilter::new(&client, &spec)?;
///
/// let x: Vec<f64> = (0..256).map(|i| (i as f64 * 0.3).sin()).collect();
/// let x = Tensor::<CpuRuntime>::from_slice(&x, &[2, 128], &device);
/// let y = filter.forward(&client, &x)?;
/// assert_eq!(y.shape(), &[2, 128]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct IirFilter<R: Runtime> {
    coefficients: TransferFunction<R>,
    padtype: PadType,
    padlen: Option<usize>,
}

impl<R: Runtime> IirFilter<R> {
    /// Design the filter described by `spec`.
    pub fn new<C>(client: &C, spec: &FilterSpec<DesignParam>) -> FilterResult<Self>
    where
        C: IirDesignAlgorithms<R>,
    {
        let coefficients = client
            .design(spec, FilterOutput::Ba)?
            .into_ba()
            .ok_or_else(|| FilterError::DesignError {
                context: "design did not return transfer function coefficients".to_string(),
            })?;
        Ok(Self::from_coefficients(coefficients))
    }

    /// Wrap precomputed coefficients.
    pub fn from_coefficients(coefficients: TransferFunction<R>) -> Self {
        Self {
            coefficients,
            padtype: PadType::default(),
            padlen: None,
        }
    }

    /// Use a different edge extension for [`forward`](Self::forward).
    pub fn with_padding(mut self, padtype: PadType, padlen: Option<usize>) -> Self {
        self.padtype = padtype;
        self.padlen = padlen;
        self
    }

    /// The `(b, a)` coefficients.
    pub fn coefficients(&self) -> &TransferFunction<R> {
        &self.coefficients
    }

    /// Number of per-example coefficient sets, `None` when shared.
    pub fn batch_size(&self) -> Option<usize> {
        self.coefficients.batch_size()
    }

    /// Zero-phase filter `x` (`[samples]` or `[batch, samples]`).
    pub fn forward<C>(&self, client: &C, x: &Tensor<R>) -> FilterResult<Tensor<R>>
    where
        C: FilterApplicationAlgorithms<R>,
    {
        client.filtfilt(&self.coefficients, x, Some(self.padtype), self.padlen)
    }
}
