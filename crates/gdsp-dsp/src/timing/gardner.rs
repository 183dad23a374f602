//! Gardner timing error detector driving a linear interpolator
//!
//! The strobe position is fractional. At each strobe the detector compares the
//! current and previous symbol samples against the sample half a symbol back:
//!
//! ```text
//! e = Re{ (y[k] - y[k-1]) * conj(y[k - 1/2]) }
//! ```
//!
//! A late strobe gives a positive error and the next strobe is pulled in.

use gdsp_core::{ComplexSample, RealSample};

use super::{TimingRecovery, lag_for_offset};

pub const DEFAULT_GARDNER_GAIN: RealSample = 0.05;

/// Largest correction applied per symbol, in samples
const MAX_STEP_ADJUST: RealSample = 0.5;

pub struct GardnerTimingRecovery {
    sps: usize,
    start: RealSample,
    gain: RealSample,
    strobe_trace: Vec<RealSample>,
    error_trace: Vec<RealSample>,
}

impl GardnerTimingRecovery {
    pub fn new(sps: usize, start: RealSample, gain: RealSample) -> Self {
        Self {
            sps: sps.max(1),
            start: start.max(0.0),
            gain,
            strobe_trace: Vec::new(),
            error_trace: Vec::new(),
        }
    }

    /// Fractional sample position of every emitted strobe
    pub fn strobe_trace(&self) -> &[RealSample] {
        &self.strobe_trace
    }

    pub fn error_trace(&self) -> &[RealSample] {
        &self.error_trace
    }
}

/// Linear interpolation at fractional position `pos`. Caller keeps `pos` in range.
fn interpolate(x: &[ComplexSample], pos: RealSample) -> ComplexSample {
    let i = pos.floor() as usize;
    let mu = pos - i as RealSample;
    if i + 1 >= x.len() {
        return x[i];
    }
    x[i] * (1.0 - mu) + x[i + 1] * mu
}

impl TimingRecovery for GardnerTimingRecovery {
    fn recover(&mut self, samples: &[ComplexSample], max_symbols: usize) -> Vec<ComplexSample> {
        self.strobe_trace.clear();
        self.error_trace.clear();

        let sps = self.sps as RealSample;
        let half = sps / 2.0;
        let mut out = Vec::with_capacity(max_symbols.min(samples.len() / self.sps + 1));
        let mut pos = self.start;
        let mut prev: Option<ComplexSample> = None;

        while pos + 1.0 < samples.len() as RealSample && out.len() < max_symbols {
            let y = interpolate(samples, pos);
            let err = match prev {
                Some(p) if pos - half >= 0.0 => {
                    let mid = interpolate(samples, pos - half);
                    ((y - p) * mid.conj()).re
                }
                _ => 0.0,
            };
            let adjust = (self.gain * err).clamp(-MAX_STEP_ADJUST, MAX_STEP_ADJUST);

            out.push(y);
            self.strobe_trace.push(pos);
            self.error_trace.push(err);

            prev = Some(y);
            pos += sps - adjust;
        }

        tracing::debug!(
            "gardner: {} strobes, last at {:.3}",
            out.len(),
            self.strobe_trace.last().copied().unwrap_or(self.start)
        );
        out
    }

    fn symbol_lag(&self) -> usize {
        lag_for_offset(self.start.round() as usize, self.sps)
    }

    fn name(&self) -> &'static str {
        "gardner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_source::BitSource;
    use crate::matched_filter::MatchedFilter;
    use crate::{fir, qam16, rrc};
    use gdsp_core::{Q1_11, Rounding};

    const SPS: usize = 4;
    const NUM_TAPS: usize = 33;
    const IDEAL_START: usize = 64;

    fn matched_output(seed: u64, num_symbols: usize) -> Vec<ComplexSample> {
        let bits = BitSource::Random { seed }.generate(4 * num_symbols);
        let symbols = qam16::bits_to_symbols(&bits).unwrap();
        let h = rrc::design_rrc(NUM_TAPS, SPS, 0.25).unwrap();
        let taps = rrc::quantize_taps(&h, Q1_11, Rounding::Nearest, rrc::DEFAULT_COEFF_PEAK).reconstructed;
        let tx = fir::pulse_shape(&symbols, &taps, SPS).unwrap();
        MatchedFilter::new(&taps).apply(&tx)
    }

    /// Strobe distance from the ideal sampling grid, in (-sps/2, sps/2]
    fn grid_deviation(pos: RealSample) -> RealSample {
        let d = (pos - IDEAL_START as RealSample).rem_euclid(SPS as RealSample);
        if d > SPS as RealSample / 2.0 { d - SPS as RealSample } else { d }
    }

    #[test]
    fn test_interpolate() {
        let x = [ComplexSample::new(0.0, 1.0), ComplexSample::new(2.0, -1.0)];
        assert_eq!(interpolate(&x, 0.25), ComplexSample::new(0.5, 0.5));
        assert_eq!(interpolate(&x, 1.0), x[1]);
    }

    #[test]
    fn test_pulls_in_late_start() {
        for seed in 0..3 {
            let mf = matched_output(seed, 500);
            let mut ted = GardnerTimingRecovery::new(SPS, IDEAL_START as RealSample + 1.0, DEFAULT_GARDNER_GAIN);
            let out = ted.recover(&mf, 500);
            assert!(out.len() > 400, "only {} strobes", out.len());
            assert_eq!(ted.symbol_lag(), 16);

            let trace = ted.strobe_trace();
            let tail = &trace[trace.len() - 100..];
            let worst = tail.iter().map(|&p| grid_deviation(p).abs()).fold(0.0, RealSample::max);
            assert!(worst < 0.25, "seed {}: worst deviation {} samples", seed, worst);
        }
    }

    #[test]
    fn test_stays_on_time() {
        let mf = matched_output(7, 400);
        let mut ted = GardnerTimingRecovery::new(SPS, IDEAL_START as RealSample, DEFAULT_GARDNER_GAIN);
        ted.recover(&mf, 400);
        let worst = ted.strobe_trace().iter().map(|&p| grid_deviation(p).abs()).fold(0.0, RealSample::max);
        assert!(worst < 0.25, "worst deviation {} samples", worst);
    }

    #[test]
    fn test_symbol_cap() {
        let mf = matched_output(1, 100);
        let mut ted = GardnerTimingRecovery::new(SPS, 8.0, DEFAULT_GARDNER_GAIN);
        assert_eq!(ted.recover(&mf, 10).len(), 10);
        assert_eq!(ted.strobe_trace().len(), 10);
    }
}
