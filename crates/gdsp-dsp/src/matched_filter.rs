use gdsp_core::{ComplexSample, RealSample};

use crate::fir;

/// Receive-side RRC. The output is divided by the peak of the TX/RX cascade,
/// so a clean symbol comes out at its original amplitude at the optimal instant.
pub struct MatchedFilter {
    taps: Vec<RealSample>,
    peak_gain: RealSample,
}

impl MatchedFilter {
    pub fn new(taps: &[RealSample]) -> Self {
        let peak = cascade_response(taps).into_iter().fold(RealSample::NEG_INFINITY, RealSample::max);
        let peak_gain = if peak.is_finite() && peak > 0.0 { peak } else { 1.0 };
        tracing::debug!("matched filter: {} taps, cascade peak {:.4}", taps.len(), peak_gain);
        Self { taps: taps.to_vec(), peak_gain }
    }

    pub fn peak_gain(&self) -> RealSample {
        self.peak_gain
    }

    pub fn apply(&self, samples: &[ComplexSample]) -> Vec<ComplexSample> {
        fir::convolve_same(samples, &self.taps)
            .into_iter()
            .map(|s| s / self.peak_gain)
            .collect()
    }
}

/// Full self-convolution `h * h`, the raised-cosine response of a matched pair
pub fn cascade_response(h: &[RealSample]) -> Vec<RealSample> {
    fir::convolve_full(h, h)
}

/// Residual intersymbol interference of a matched pair at symbol-spaced instants
#[derive(Debug, Clone, PartialEq)]
pub struct IsiReport {
    pub peak: RealSample,
    /// Largest |cascade[center + k*sps]| / peak over k != 0
    pub worst_isi: RealSample,
    /// Sum of squared symbol-spaced side samples over peak^2
    pub isi_power: RealSample,
}

pub fn isi_report(h: &[RealSample], sps: usize) -> IsiReport {
    let rc = cascade_response(h);
    if rc.is_empty() || sps == 0 {
        return IsiReport { peak: 0.0, worst_isi: 0.0, isi_power: 0.0 };
    }
    let center = rc.len() / 2;
    let peak = rc[center];

    let side = rc
        .iter()
        .enumerate()
        .filter(|(n, _)| *n != center && n.abs_diff(center) % sps == 0)
        .map(|(_, v)| v / peak);

    let (worst_isi, isi_power) = side.fold((0.0, 0.0), |(w, p): (RealSample, RealSample), r| (w.max(r.abs()), p + r * r));
    IsiReport { peak, worst_isi, isi_power }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rrc::design_rrc;

    #[test]
    fn test_unit_energy_cascade_peak_is_one() {
        let h = design_rrc(33, 4, 0.25).unwrap();
        let mf = MatchedFilter::new(&h);
        assert!((mf.peak_gain() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_isi_small_for_long_filter() {
        let h = design_rrc(65, 4, 0.35).unwrap();
        let r = isi_report(&h, 4);
        assert!(r.worst_isi < 0.02, "worst ISI {}", r.worst_isi);

        // A short truncation hurts
        let short = isi_report(&design_rrc(9, 4, 0.35).unwrap(), 4);
        assert!(short.worst_isi > r.worst_isi);
    }

    #[test]
    fn test_matched_pair_recovers_symbol() {
        let h = design_rrc(33, 4, 0.25).unwrap();
        let scaled: Vec<RealSample> = h.iter().map(|x| x * 0.7).collect();
        let mf = MatchedFilter::new(&scaled);

        let mut x = vec![ComplexSample::new(0.0, 0.0); 64];
        x[32] = ComplexSample::new(0.6, -0.2);
        let tx = fir::convolve_same(&x, &scaled);
        let rx = mf.apply(&tx);
        assert!((rx[32] - x[32]).norm() < 1e-12);
    }
}
