//! CPU implementation of IIR filter design.

// Allow many arguments for filter design functions that match scipy's signature
#![allow(clippy::too_many_arguments)]

use crate::error::FilterResult;
use crate::filter::impl_generic::{
    analog_prototype_impl, bilinear_zpk_impl, design_impl, iirfilter_impl, to_band_impl,
    zpk2tf_impl,
};
use crate::filter::spec::{DesignParam, FilterFamily, FilterSpec};
use crate::filter::traits::iir_design::{IirDesignAlgorithms, IirDesignResult};
use crate::filter::types::{
    AnalogPrototype, BandType, FilterKind, FilterOutput, TransferFunction, ZpkFilter,
};
use numr::runtime::cpu::{CpuClient, CpuRuntime};

impl IirDesignAlgorithms<CpuRuntime> for CpuClient {
    fn analog_prototype(
        &self,
        family: &FilterFamily<f64>,
        order: usize,
    ) -> FilterResult<AnalogPrototype<CpuRuntime>> {
        analog_prototype_impl(self, family, order)
    }

    fn to_band(
        &self,
        proto: &AnalogPrototype<CpuRuntime>,
        band: BandType,
        edges: &[f64],
    ) -> FilterResult<AnalogPrototype<CpuRuntime>> {
        to_band_impl(self, proto, band, edges)
    }

    fn bilinear_zpk(
        &self,
        analog: &AnalogPrototype<CpuRuntime>,
        fs: f64,
    ) -> FilterResult<ZpkFilter<CpuRuntime>> {
        bilinear_zpk_impl(self, analog, fs)
    }

    fn zpk2tf(&self, zpk: &ZpkFilter<CpuRuntime>) -> FilterResult<TransferFunction<CpuRuntime>> {
        zpk2tf_impl(self, zpk)
    }

    fn design(
        &self,
        spec: &FilterSpec<DesignParam>,
        output: FilterOutput,
    ) -> FilterResult<IirDesignResult<CpuRuntime>> {
        design_impl(self, spec, output)
    }

    fn iirfilter(
        &self,
        order: usize,
        cutoff: &[DesignParam],
        kind: FilterKind,
        band: BandType,
        analog: bool,
        fs: Option<f64>,
        rp: Option<DesignParam>,
        rs: Option<DesignParam>,
        output: FilterOutput,
    ) -> FilterResult<IirDesignResult<CpuRuntime>> {
        iirfilter_impl(self, order, cutoff, kind, band, analog, fs, rp, rs, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn scalar(v: f64) -> DesignParam {
        DesignParam::Scalar(v)
    }

    #[test]
    fn test_iirfilter_matches_staged_pipeline() {
        let (client, _device) = setup();

        // iirfilter with normalized cutoff vs the individual stages
        let result = client
            .iirfilter(
                4,
                &[scalar(0.2)],
                FilterKind::Butterworth,
                BandType::Lowpass,
                false,
                None,
                None,
                None,
                FilterOutput::Ba,
            )
            .unwrap();

        let proto = client
            .analog_prototype(&FilterFamily::Butterworth, 4)
            .unwrap();
        let warped = 4.0 * (std::f64::consts::PI * 0.2 / 2.0).tan();
        let analog = client.to_band(&proto, BandType::Lowpass, &[warped]).unwrap();
        let digital = client.bilinear_zpk(&analog, 2.0).unwrap();
        let staged = client.zpk2tf(&digital).unwrap();

        let tf = result.as_ba().unwrap();
        let b1: Vec<f64> = tf.b.to_vec();
        let b2: Vec<f64> = staged.b.to_vec();
        let a1: Vec<f64> = tf.a.to_vec();
        let a2: Vec<f64> = staged.a.to_vec();

        for (v1, v2) in b1.iter().zip(b2.iter()).chain(a1.iter().zip(a2.iter())) {
            assert!((v1 - v2).abs() < 1e-14);
        }
    }

    #[test]
    fn test_iirfilter_elliptic_zpk() {
        let (client, _device) = setup();

        let result = client
            .iirfilter(
                3,
                &[scalar(0.25)],
                FilterKind::Elliptic,
                BandType::Lowpass,
                false,
                None,
                Some(scalar(1.0)),
                Some(scalar(40.0)),
                FilterOutput::Zpk,
            )
            .unwrap();

        let zpk = result.as_zpk().unwrap();
        assert_eq!(zpk.len(), 1);
        assert_eq!(zpk[0].num_poles(), 3);
        assert_eq!(zpk[0].num_zeros(), 3);
    }

    #[test]
    fn test_iirfilter_bessel() {
        let (client, _device) = setup();

        let result = client
            .iirfilter(
                4,
                &[scalar(0.2)],
                FilterKind::Bessel,
                BandType::Lowpass,
                false,
                None,
                None,
                None,
                FilterOutput::Ba,
            )
            .unwrap();

        let tf = result.as_ba().unwrap();
        assert_eq!(tf.b.shape(), &[5]);
        assert_eq!(tf.a.shape(), &[5]);
    }

    #[test]
    fn test_iirfilter_bandpass_doubles_order() {
        let (client, _device) = setup();

        let result = client
            .iirfilter(
                2,
                &[scalar(0.2), scalar(0.4)],
                FilterKind::Butterworth,
                BandType::Bandpass,
                false,
                None,
                None,
                None,
                FilterOutput::Zpk,
            )
            .unwrap();

        let zpk = result.as_zpk().unwrap();
        assert_eq!(zpk[0].num_poles(), 4);
    }

    #[test]
    fn test_iirfilter_missing_rp() {
        let (client, _device) = setup();

        let result = client.iirfilter(
            3,
            &[scalar(0.25)],
            FilterKind::Chebyshev1,
            BandType::Lowpass,
            false,
            None,
            None,
            None,
            FilterOutput::Ba,
        );

        assert!(matches!(
            result,
            Err(FilterError::MissingParameter { parameter: "rp", .. })
        ));
    }

    #[test]
    fn test_iirfilter_analog_rejects_fs() {
        let (client, _device) = setup();

        let result = client.iirfilter(
            3,
            &[scalar(10.0)],
            FilterKind::Butterworth,
            BandType::Lowpass,
            true,
            Some(100.0),
            None,
            None,
            FilterOutput::Ba,
        );

        assert!(matches!(result, Err(FilterError::InvalidParameter { .. })));
    }

    #[test]
    fn test_iirfilter_wrong_cutoff_count() {
        let (client, _device) = setup();

        let result = client.iirfilter(
            3,
            &[scalar(0.1), scalar(0.2)],
            FilterKind::Butterworth,
            BandType::Highpass,
            false,
            None,
            None,
            None,
            FilterOutput::Ba,
        );

        assert!(result.is_err());
    }
}
