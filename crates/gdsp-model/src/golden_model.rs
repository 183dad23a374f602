use gdsp_config::{AmbiguityMode, BitSourceKind, ModelConfig, TimingMode};
use gdsp_core::fixed_point::{self, Quantized};
use gdsp_core::{ComplexSample, GdspError, QFormat, RealSample, Rounding, split_iq};
use gdsp_dsp::fir::pulse_shape;
use gdsp_dsp::qam16::{self, bits_to_symbols};
use gdsp_dsp::rrc;
use gdsp_dsp::{
    BitSource, Channel, ChannelOutput, ChannelParams, CostasLoop, CostasOutput, FixedOffsetSampler, GardnerTimingRecovery,
    LoopGains, MatchedFilter, PilotQuadrantResolver, QuadrantResolver, QuantizedTaps, Resolution, SamplingOffset,
    TimingRecovery, design_rrc, quantize_taps,
};
use gdsp_vectors::{VectorExporter, VectorSink};

use crate::error::{ModelError, ModelResult};
use crate::report::RunReport;

/// A complex stream quantized to both rails of one format
#[derive(Debug, Clone)]
pub struct QuantizedStream {
    pub name: &'static str,
    pub format: QFormat,
    pub i: Quantized,
    pub q: Quantized,
}

impl QuantizedStream {
    fn new(name: &'static str, samples: &[ComplexSample], format: QFormat, rounding: Rounding) -> Self {
        let (i, q) = split_iq(samples);
        Self {
            name,
            format,
            i: fixed_point::quantize(&i, format, rounding),
            q: fixed_point::quantize(&q, format, rounding),
        }
    }

    pub fn saturated(&self) -> usize {
        self.i.saturated + self.q.saturated
    }

    pub fn len(&self) -> usize {
        self.i.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i.codes.is_empty()
    }
}

/// Every intermediate array of one run
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub bits: Vec<u8>,
    pub tx_symbols: Vec<ComplexSample>,
    /// Unit-energy float design
    pub taps: Vec<RealSample>,
    pub quantized_taps: QuantizedTaps,
    /// Shaped with the scaled float taps
    pub tx_float: Vec<ComplexSample>,
    /// Shaped with the quantized taps, the waveform the hardware produces
    pub tx_fixed: Vec<ComplexSample>,
    pub channel: ChannelOutput,
    pub mf_output: Vec<ComplexSample>,
    pub timing: &'static str,
    /// Transmitted index of the first recovered symbol
    pub symbol_lag: usize,
    pub recovered: Vec<ComplexSample>,
    pub costas: CostasOutput,
    pub resolution: Option<Resolution>,
    /// Receiver output after the resolver, when one runs
    pub demod: Vec<ComplexSample>,
    /// Quantized streams in export order, excluding the coefficients
    pub streams: Vec<QuantizedStream>,
}

impl RunArtifacts {
    pub fn stream(&self, name: &str) -> Option<&QuantizedStream> {
        self.streams.iter().find(|s| s.name == name)
    }
}

/// One configured run of the transmit/channel/receive chain
pub struct GoldenModel {
    cfg: ModelConfig,
}

impl GoldenModel {
    pub fn new(cfg: ModelConfig) -> ModelResult<Self> {
        cfg.validate().map_err(|e| ModelError::Config(e.to_string()))?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.cfg
    }

    /// Simulate and export every stage record to `sink`, unless export is disabled
    pub fn run<S: VectorSink>(&self, sink: S) -> ModelResult<RunReport> {
        let artifacts = self.simulate()?;
        let exported = if self.cfg.output.export {
            self.export(&artifacts, sink)?
        } else {
            tracing::info!("export disabled, no vectors written");
            Vec::new()
        };
        let report = RunReport::new(&self.cfg, &artifacts, exported);
        report.log();
        Ok(report)
    }

    /// Simulate without touching any sink
    pub fn evaluate(&self) -> ModelResult<RunReport> {
        let artifacts = self.simulate()?;
        Ok(RunReport::new(&self.cfg, &artifacts, Vec::new()))
    }

    pub fn simulate(&self) -> ModelResult<RunArtifacts> {
        let m = &self.cfg.model;
        let fp = &self.cfg.fixed_point;
        let rx = &self.cfg.receiver;
        tracing::info!(
            "golden model: {} symbols, sps {}, {} taps, alpha {}, phase offset {} deg",
            m.num_symbols,
            m.sps,
            m.num_taps,
            m.rolloff,
            self.cfg.channel.phase_offset_deg
        );

        qam16::log_constellation();

        // Payload
        let bits = self.bit_source().generate(4 * m.num_symbols);
        let tx_symbols = bits_to_symbols(&bits)?;
        tracing::debug!(stage = "mapper", "{} bits -> {} symbols", bits.len(), tx_symbols.len());

        // Pulse shaping filter and its fixed-point version
        let taps = design_rrc(m.num_taps, m.sps, m.rolloff)?;
        gdsp_core::assert_warn!(
            rrc::symmetry_error(&taps) < 1e-9 && (rrc::energy(&taps) - 1.0).abs() < 1e-9,
            "RRC design off: asymmetry {:.3e}, energy {:.12}",
            rrc::symmetry_error(&taps),
            rrc::energy(&taps)
        );
        let quantized_taps = quantize_taps(&taps, fp.sample_format, fp.rounding, fp.coeff_peak);
        tracing::info!(
            stage = "rrc",
            "scale {:.4}, SQNR {:.1} dB, max error {:.3e}",
            quantized_taps.scale_factor,
            quantized_taps.sqnr_db,
            quantized_taps.max_error
        );

        let tx_float = pulse_shape(&tx_symbols, &quantized_taps.scaled, m.sps)?;
        let tx_fixed = pulse_shape(&tx_symbols, &quantized_taps.reconstructed, m.sps)?;

        let channel = Channel::new(self.channel_params()).apply(&tx_fixed)?;

        // Receiver
        let mf_output = MatchedFilter::new(&quantized_taps.reconstructed).apply(&channel.samples);

        let mut timing = self.timing_recovery();
        let recovered = timing.recover(&mf_output, m.num_symbols);
        let symbol_lag = timing.symbol_lag();
        tracing::debug!(stage = "timing", "{}: {} symbols, lag {}", timing.name(), recovered.len(), symbol_lag);

        let mut costas = CostasLoop::new(LoopGains { kp: rx.kp, ki: rx.ki }, rx.initial_phase_deg.to_radians());
        let costas_out = costas.run(&recovered);

        let resolution = match rx.ambiguity {
            AmbiguityMode::None => None,
            AmbiguityMode::Pilot => Some(self.pilot_resolver(&tx_symbols, symbol_lag)?.resolve(&costas_out.symbols)?),
        };
        let demod = match &resolution {
            Some(r) => r.symbols.clone(),
            None => costas_out.symbols.clone(),
        };

        let streams = vec![
            QuantizedStream::new("qam16_symbols", &tx_symbols, fp.sample_format, fp.rounding),
            QuantizedStream::new("tx_filtered", &tx_fixed, fp.sample_format, fp.rounding),
            QuantizedStream::new("rx_noisy", &channel.samples, fp.sample_format, fp.rounding),
            QuantizedStream::new("rx_demod", &demod, fp.rx_format, fp.rounding),
        ];

        Ok(RunArtifacts {
            bits,
            tx_symbols,
            taps,
            quantized_taps,
            tx_float,
            tx_fixed,
            channel,
            mf_output,
            timing: timing.name(),
            symbol_lag,
            recovered,
            costas: costas_out,
            resolution,
            demod,
            streams,
        })
    }

    fn bit_source(&self) -> BitSource {
        let seed = self.cfg.model.seed;
        match self.cfg.model.bit_source {
            BitSourceKind::Random => BitSource::Random { seed },
            BitSourceKind::Prbs15 => BitSource::Prbs15 { seed: (seed & 0x7FFF) as u16 },
        }
    }

    fn channel_params(&self) -> ChannelParams {
        let ch = &self.cfg.channel;
        ChannelParams {
            phase_offset_deg: ch.phase_offset_deg,
            cfo_hz: ch.cfo_hz,
            sample_rate_hz: ch.sample_rate_hz,
            snr_db: ch.snr_db,
            noise_seed: self.cfg.noise_seed(),
        }
    }

    fn timing_recovery(&self) -> Box<dyn TimingRecovery> {
        let m = &self.cfg.model;
        let rx = &self.cfg.receiver;
        let mode = SamplingOffset::from(rx.sampling_offset);
        match rx.timing {
            TimingMode::FixedOffset => Box::new(FixedOffsetSampler::with_mode(mode, m.num_taps, m.sps)),
            TimingMode::Gardner => {
                let start = mode.samples(m.num_taps, m.sps) as RealSample;
                Box::new(GardnerTimingRecovery::new(m.sps, start, rx.gardner_gain))
            }
        }
    }

    /// Pilots are the transmitted symbols that land at `settle_symbols` in the loop output
    fn pilot_resolver(&self, tx_symbols: &[ComplexSample], symbol_lag: usize) -> ModelResult<PilotQuadrantResolver> {
        let rx = &self.cfg.receiver;
        let start = symbol_lag + rx.settle_symbols;
        let end = start + rx.pilot_len;
        let pilots = tx_symbols.get(start..end).ok_or(GdspError::PilotWindow {
            start,
            end,
            len: tx_symbols.len(),
        })?;
        Ok(PilotQuadrantResolver::new(pilots.to_vec(), rx.settle_symbols))
    }

    fn export<S: VectorSink>(&self, artifacts: &RunArtifacts, sink: S) -> ModelResult<Vec<String>> {
        let m = &self.cfg.model;
        let fp = &self.cfg.fixed_point;
        let mut exporter = VectorExporter::new(sink);

        let coeff_comment = format!("RRC α={}, {} taps, SPS={}", m.rolloff, m.num_taps, m.sps);
        for stream in &artifacts.streams {
            exporter.export_iq_codes(stream.name, &stream.i.codes, &stream.q.codes, stream.format)?;
            // Coefficients follow the symbols so the record order matches the chain
            if stream.name == "qam16_symbols" {
                exporter.export_all("rrc_coeffs", &artifacts.quantized_taps.codes, fp.sample_format, Some(&coeff_comment))?;
            }
        }
        Ok(exporter.written().to_vec())
    }
}
