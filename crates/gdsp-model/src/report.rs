use std::fmt;

use gdsp_config::ModelConfig;
use gdsp_core::{RealSample, mean_power};
use gdsp_dsp::qam16::QAM16_NORM;
use gdsp_dsp::{IsiReport, RotationMatch, best_rotation, isi_report, rotation_match};

use crate::golden_model::RunArtifacts;

/// Loop error averaged over this many final symbols
pub const TRAILING_WINDOW: usize = 100;

/// Half the distance between adjacent constellation levels
pub const DECISION_TOLERANCE: RealSample = QAM16_NORM;

/// Statistics and lock diagnostics of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub phase_offset_deg: RealSample,
    pub num_symbols: usize,
    pub timing: &'static str,
    pub symbol_lag: usize,
    pub recovered_symbols: usize,

    pub coeff_scale: RealSample,
    pub coeff_sqnr_db: RealSample,
    pub coeff_max_error: RealSample,
    pub coeff_saturated: usize,
    /// Residual ISI of the quantized TX/RX pair
    pub isi: IsiReport,
    /// Largest sample difference between float and quantized tap waveforms
    pub tx_tap_error: RealSample,

    pub signal_power: RealSample,
    pub noise_var: RealSample,
    pub measured_snr_db: Option<RealSample>,
    /// Matched-filter output power
    pub mf_power: RealSample,

    pub final_phase_deg: RealSample,
    /// Loop frequency state, radians per symbol
    pub final_freq: RealSample,
    pub trailing_error_mean: RealSample,
    /// Best quarter turn of the raw loop output against the transmitted symbols
    pub rotation: RotationMatch,
    /// Turn applied by the resolver and the unrotated match of its output
    pub resolved: Option<(u8, RotationMatch)>,

    /// Saturated values per exported stream
    pub saturations: Vec<(&'static str, usize)>,
    pub exported: Vec<String>,
}

impl RunReport {
    pub fn new(cfg: &ModelConfig, a: &RunArtifacts, exported: Vec<String>) -> Self {
        let settle = cfg.receiver.settle_symbols;
        let rotation = best_rotation(&a.costas.symbols, &a.tx_symbols, a.symbol_lag, settle, DECISION_TOLERANCE);
        let resolved = a.resolution.as_ref().map(|r| {
            let m = rotation_match(&a.demod, &a.tx_symbols, a.symbol_lag, settle, DECISION_TOLERANCE, 0);
            (r.quarter_turns, m)
        });

        let tx_tap_error = a
            .tx_float
            .iter()
            .zip(&a.tx_fixed)
            .map(|(f, x)| (f - x).norm())
            .fold(0.0, RealSample::max);

        let mut saturations: Vec<(&'static str, usize)> = vec![("rrc_coeffs", a.quantized_taps.saturated)];
        saturations.extend(a.streams.iter().map(|s| (s.name, s.saturated())));

        Self {
            phase_offset_deg: cfg.channel.phase_offset_deg,
            num_symbols: a.tx_symbols.len(),
            timing: a.timing,
            symbol_lag: a.symbol_lag,
            recovered_symbols: a.recovered.len(),
            coeff_scale: a.quantized_taps.scale_factor,
            coeff_sqnr_db: a.quantized_taps.sqnr_db,
            coeff_max_error: a.quantized_taps.max_error,
            coeff_saturated: a.quantized_taps.saturated,
            isi: isi_report(&a.quantized_taps.reconstructed, cfg.model.sps),
            tx_tap_error,
            signal_power: a.channel.signal_power,
            noise_var: a.channel.noise_var,
            measured_snr_db: a.channel.measured_snr_db,
            mf_power: mean_power(&a.mf_output),
            final_phase_deg: a.costas.phase_trace.last().copied().unwrap_or(0.0).to_degrees(),
            final_freq: a.costas.freq_trace.last().copied().unwrap_or(0.0),
            trailing_error_mean: a.costas.trailing_error_mean(TRAILING_WINDOW),
            rotation,
            resolved,
            saturations,
            exported,
        }
    }

    /// Fraction of settled symbols decoded correctly by the final receiver stream.
    /// Without a resolver the best quarter turn is assumed known.
    pub fn accuracy(&self) -> RealSample {
        match &self.resolved {
            Some((_, m)) => m.accuracy(),
            None => self.rotation.accuracy(),
        }
    }

    pub fn total_saturations(&self) -> usize {
        self.saturations.iter().map(|(_, n)| n).sum()
    }

    pub fn log(&self) {
        tracing::info!(
            stage = "report",
            "{}: {}/{} symbols recovered, lag {}",
            self.timing,
            self.recovered_symbols,
            self.num_symbols,
            self.symbol_lag
        );
        tracing::info!(
            stage = "report",
            "loop: phase {:.3} deg, freq {:.3e} rad/sym, trailing error {:.3e}",
            self.final_phase_deg,
            self.final_freq,
            self.trailing_error_mean
        );
        tracing::info!(
            stage = "report",
            "rotation {} x 90 deg, {}/{} matched",
            self.rotation.quarter_turns,
            self.rotation.matches,
            self.rotation.compared
        );
        for (name, n) in self.saturations.iter().filter(|(_, n)| *n > 0) {
            tracing::warn!(stage = "report", "{}: {} values saturated", name, n);
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Phase offset       : {:+.2} deg", self.phase_offset_deg)?;
        writeln!(
            f,
            "Timing             : {} ({} of {} symbols, lag {})",
            self.timing, self.recovered_symbols, self.num_symbols, self.symbol_lag
        )?;
        writeln!(
            f,
            "RRC coefficients   : scale {:.4}, SQNR {:.1} dB, max error {:.3e}",
            self.coeff_scale, self.coeff_sqnr_db, self.coeff_max_error
        )?;
        writeln!(f, "Residual ISI       : worst {:.2e}, power {:.2e}", self.isi.worst_isi, self.isi.isi_power)?;
        match self.measured_snr_db {
            Some(snr) => writeln!(f, "Channel            : measured SNR {:.2} dB (noise var {:.3e})", snr, self.noise_var)?,
            None => writeln!(f, "Channel            : noiseless")?,
        }
        writeln!(
            f,
            "Costas loop        : phase {:+.3} deg, freq {:+.3e} rad/sym, trailing error {:.3e}",
            self.final_phase_deg, self.final_freq, self.trailing_error_mean
        )?;
        writeln!(
            f,
            "Best rotation      : {} x 90 deg, {}/{} ({:.2}%)",
            self.rotation.quarter_turns,
            self.rotation.matches,
            self.rotation.compared,
            100.0 * self.rotation.accuracy()
        )?;
        if let Some((turns, m)) = &self.resolved {
            writeln!(
                f,
                "Pilot resolver     : {} x 90 deg, {}/{} ({:.2}%)",
                turns,
                m.matches,
                m.compared,
                100.0 * m.accuracy()
            )?;
        }
        writeln!(f, "Saturated values   : {}", self.total_saturations())?;
        write!(f, "Records written    : {}", self.exported.len())
    }
}
