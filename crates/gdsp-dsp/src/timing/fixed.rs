use gdsp_core::ComplexSample;

use super::{SamplingOffset, TimingRecovery, lag_for_offset};

/// Static decimator: every `sps`-th sample from a fixed offset
pub struct FixedOffsetSampler {
    sps: usize,
    offset: usize,
}

impl FixedOffsetSampler {
    pub fn new(sps: usize, offset: usize) -> Self {
        Self { sps: sps.max(1), offset }
    }

    pub fn with_mode(mode: SamplingOffset, num_taps: usize, sps: usize) -> Self {
        Self::new(sps, mode.samples(num_taps, sps))
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl TimingRecovery for FixedOffsetSampler {
    fn recover(&mut self, samples: &[ComplexSample], max_symbols: usize) -> Vec<ComplexSample> {
        samples
            .iter()
            .skip(self.offset)
            .step_by(self.sps)
            .take(max_symbols)
            .copied()
            .collect()
    }

    fn symbol_lag(&self) -> usize {
        lag_for_offset(self.offset, self.sps)
    }

    fn name(&self) -> &'static str {
        "fixed-offset"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimation() {
        let x: Vec<ComplexSample> = (0..20).map(|n| ComplexSample::new(n as f64, 0.0)).collect();
        let mut s = FixedOffsetSampler::new(4, 6);
        let y = s.recover(&x, 100);
        assert_eq!(y.iter().map(|v| v.re as usize).collect::<Vec<_>>(), vec![6, 10, 14, 18]);
        assert_eq!(s.recover(&x, 2).len(), 2);
        assert_eq!(s.symbol_lag(), 2);
    }

    #[test]
    fn test_offset_past_end() {
        let x = vec![ComplexSample::new(1.0, 0.0); 10];
        let mut s = FixedOffsetSampler::with_mode(SamplingOffset::HalfFilter, 33, 4);
        assert!(s.recover(&x, 10).is_empty());
    }
}
