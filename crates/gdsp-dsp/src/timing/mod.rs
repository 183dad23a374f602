//! Symbol timing recovery
//!
//! Every strategy consumes matched-filter output at `sps` samples per symbol and
//! emits one sample per symbol. The stream it emits starts `symbol_lag()` symbols
//! into the transmitted sequence.

pub mod fixed;
pub mod gardner;

use gdsp_core::ComplexSample;

pub use fixed::FixedOffsetSampler;
pub use gardner::GardnerTimingRecovery;

pub trait TimingRecovery {
    /// Produce at most `max_symbols` symbol-rate samples
    fn recover(&mut self, samples: &[ComplexSample], max_symbols: usize) -> Vec<ComplexSample>;

    /// Offset, in symbols, between transmitted symbol 0 and the first output
    fn symbol_lag(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Where the first symbol strobe lands in the matched-filter output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingOffset {
    /// `floor(num_taps/2)` symbol periods, skipping the filter ramp-up
    #[default]
    HalfFilter,
    /// `num_taps - 1` samples, the combined group delay of the TX/RX pair
    GroupDelay,
}

impl SamplingOffset {
    pub fn samples(self, num_taps: usize, sps: usize) -> usize {
        match self {
            SamplingOffset::HalfFilter => (num_taps / 2) * sps,
            SamplingOffset::GroupDelay => num_taps.saturating_sub(1),
        }
    }

    /// Transmitted symbols that precede the first strobe
    pub fn symbol_lag(self, num_taps: usize, sps: usize) -> usize {
        lag_for_offset(self.samples(num_taps, sps), sps)
    }
}

/// Symbol lag for a strobe starting `offset` samples in, rounded to the nearest symbol
pub(crate) fn lag_for_offset(offset: usize, sps: usize) -> usize {
    (offset + sps / 2) / sps.max(1)
}
