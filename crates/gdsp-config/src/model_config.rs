use serde::Deserialize;

use gdsp_core::{Q1_11, Q2_10, QFormat, Rounding};
use gdsp_dsp::channel::DEFAULT_SAMPLE_RATE_HZ;
use gdsp_dsp::costas::{DEFAULT_KI, DEFAULT_KP};
use gdsp_dsp::rrc::DEFAULT_COEFF_PEAK;
use gdsp_dsp::timing::SamplingOffset;
use gdsp_dsp::timing::gardner::DEFAULT_GARDNER_GAIN;

/// Payload bit generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BitSourceKind {
    Random,
    Prbs15,
}

/// Symbol timing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TimingMode {
    FixedOffset,
    Gardner,
}

/// First symbol strobe position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SamplingOffsetMode {
    /// floor(num_taps/2) symbol periods
    HalfFilter,
    /// num_taps - 1 samples
    GroupDelay,
}

impl From<SamplingOffsetMode> for SamplingOffset {
    fn from(mode: SamplingOffsetMode) -> Self {
        match mode {
            SamplingOffsetMode::HalfFilter => SamplingOffset::HalfFilter,
            SamplingOffsetMode::GroupDelay => SamplingOffset::GroupDelay,
        }
    }
}

/// What to do about the carrier loop's 90 degree ambiguity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AmbiguityMode {
    /// Leave the loop output as is
    None,
    /// Resolve from a known pilot window
    Pilot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfgModel {
    pub num_symbols: usize,
    pub sps: usize,
    /// Must be odd
    pub num_taps: usize,
    pub rolloff: f64,
    pub seed: u64,
    pub bit_source: BitSourceKind,
}

impl Default for CfgModel {
    fn default() -> Self {
        Self {
            num_symbols: 256,
            sps: 4,
            num_taps: 33,
            rolloff: 0.25,
            seed: 42,
            bit_source: BitSourceKind::Random,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfgFixedPoint {
    /// Symbols, coefficients and TX/RX samples
    pub sample_format: QFormat,
    /// Demodulated symbols after carrier recovery
    pub rx_format: QFormat,
    pub rounding: Rounding,
    /// Largest coefficient magnitude after scaling
    pub coeff_peak: f64,
}

impl Default for CfgFixedPoint {
    fn default() -> Self {
        Self {
            sample_format: Q1_11,
            rx_format: Q2_10,
            rounding: Rounding::Convergent,
            coeff_peak: DEFAULT_COEFF_PEAK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfgChannel {
    pub phase_offset_deg: f64,
    pub cfo_hz: Option<f64>,
    pub sample_rate_hz: f64,
    /// None disables noise
    pub snr_db: Option<f64>,
    /// Defaults to seed + 1
    pub noise_seed: Option<u64>,
}

impl Default for CfgChannel {
    fn default() -> Self {
        Self {
            phase_offset_deg: 0.0,
            cfo_hz: None,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            snr_db: Some(20.0),
            noise_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfgReceiver {
    pub timing: TimingMode,
    pub sampling_offset: SamplingOffsetMode,
    pub gardner_gain: f64,
    pub kp: f64,
    pub ki: f64,
    pub initial_phase_deg: f64,
    /// Symbols ignored by the lock diagnostics and skipped before the pilot window
    pub settle_symbols: usize,
    pub ambiguity: AmbiguityMode,
    pub pilot_len: usize,
}

impl Default for CfgReceiver {
    fn default() -> Self {
        Self {
            timing: TimingMode::FixedOffset,
            sampling_offset: SamplingOffsetMode::HalfFilter,
            gardner_gain: DEFAULT_GARDNER_GAIN,
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            initial_phase_deg: 0.0,
            settle_symbols: 100,
            ambiguity: AmbiguityMode::None,
            pilot_len: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfgOutput {
    pub vector_dir: String,
    /// When false the run computes everything but writes no records
    pub export: bool,
}

impl Default for CfgOutput {
    fn default() -> Self {
        Self {
            vector_dir: "sim/vectors".to_string(),
            export: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    pub debug_log: Option<String>,
    pub model: CfgModel,
    pub fixed_point: CfgFixedPoint,
    pub channel: CfgChannel,
    pub receiver: CfgReceiver,
    pub output: CfgOutput,
}

impl ModelConfig {
    pub fn noise_seed(&self) -> u64 {
        self.channel.noise_seed.unwrap_or(self.model.seed.wrapping_add(1))
    }

    /// Config-level consistency. Filter and format parameters are checked where they are used.
    pub fn validate(&self) -> Result<(), &str> {
        if self.model.num_symbols == 0 {
            return Err("model.num_symbols must be > 0");
        }
        if self.model.sps == 0 {
            return Err("model.sps must be > 0");
        }
        if !(self.channel.sample_rate_hz > 0.0) {
            return Err("channel.sample_rate_hz must be > 0");
        }
        if let Some(snr) = self.channel.snr_db {
            if !snr.is_finite() {
                return Err("channel.snr_db must be finite");
            }
        }
        let r = &self.receiver;
        if !(r.kp.is_finite() && r.ki.is_finite() && r.gardner_gain.is_finite()) {
            return Err("receiver gains must be finite");
        }
        if !(self.fixed_point.coeff_peak > 0.0 && self.fixed_point.coeff_peak <= self.fixed_point.sample_format.max_value()) {
            return Err("fixed_point.coeff_peak must lie inside the sample format range");
        }
        if r.ambiguity == AmbiguityMode::Pilot {
            if r.pilot_len == 0 {
                return Err("receiver.pilot_len must be > 0 when ambiguity = Pilot");
            }
            // Pilots are taken from the transmitted stream after the timing lag
            let lag = SamplingOffset::from(r.sampling_offset).symbol_lag(self.model.num_taps, self.model.sps);
            if lag + r.settle_symbols + r.pilot_len > self.model.num_symbols {
                return Err("pilot window (timing lag + settle_symbols + pilot_len) exceeds num_symbols");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = ModelConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.noise_seed(), 43);
    }

    #[test]
    fn test_pilot_window_must_fit() {
        let mut cfg = ModelConfig::default();
        cfg.receiver.ambiguity = AmbiguityMode::Pilot;
        // 16 symbols of lag ahead of 100 settle and 32 pilot symbols
        cfg.model.num_symbols = 132;
        assert!(cfg.validate().is_err());
        cfg.model.num_symbols = 147;
        assert!(cfg.validate().is_err());
        cfg.model.num_symbols = 148;
        assert_eq!(cfg.validate(), Ok(()));

        // Group delay strobe: 8 symbols of lag
        cfg.receiver.sampling_offset = SamplingOffsetMode::GroupDelay;
        cfg.model.num_symbols = 139;
        assert!(cfg.validate().is_err());
        cfg.model.num_symbols = 140;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_coeff_peak_range() {
        let mut cfg = ModelConfig::default();
        cfg.fixed_point.coeff_peak = 1.0;
        assert!(cfg.validate().is_err());
    }
}
