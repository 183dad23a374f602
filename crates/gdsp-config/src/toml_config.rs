use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use gdsp_core::{QFormat, Rounding};

use super::model_config::{
    AmbiguityMode, BitSourceKind, CfgChannel, CfgFixedPoint, CfgModel, CfgOutput, CfgReceiver, ModelConfig, SamplingOffsetMode,
    TimingMode,
};

/// Build `ModelConfig` from a TOML configuration string
pub fn from_toml_str(toml_str: &str) -> Result<ModelConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref m) = root.model {
        check_extra("model", &m.extra)?;
    }
    if let Some(ref fp) = root.fixed_point {
        check_extra("fixed_point", &fp.extra)?;
        if let Some(ref f) = fp.sample_format {
            check_extra("fixed_point.sample_format", &f.extra)?;
        }
        if let Some(ref f) = fp.rx_format {
            check_extra("fixed_point.rx_format", &f.extra)?;
        }
    }
    if let Some(ref ch) = root.channel {
        check_extra("channel", &ch.extra)?;
    }
    if let Some(ref rx) = root.receiver {
        check_extra("receiver", &rx.extra)?;
    }
    if let Some(ref out) = root.output {
        check_extra("output", &out.extra)?;
    }

    // Start from defaults, then apply whatever the file provides
    let mut cfg = ModelConfig {
        debug_log: root.debug_log,
        ..Default::default()
    };

    if let Some(m) = root.model {
        apply_model_patch(&mut cfg.model, m);
    }
    if let Some(fp) = root.fixed_point {
        apply_fixed_point_patch(&mut cfg.fixed_point, fp)?;
    }
    if let Some(ch) = root.channel {
        apply_channel_patch(&mut cfg.channel, ch);
    }
    if let Some(rx) = root.receiver {
        apply_receiver_patch(&mut cfg.receiver, rx);
    }
    if let Some(out) = root.output {
        apply_output_patch(&mut cfg.output, out);
    }

    cfg.validate().map_err(|e| format!("Invalid configuration: {}", e))?;
    Ok(cfg)
}

/// Build `ModelConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<ModelConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `ModelConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ModelConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn check_extra(section: &str, extra: &HashMap<String, Value>) -> Result<(), String> {
    if extra.is_empty() {
        Ok(())
    } else {
        Err(format!("Unrecognized fields: {}::{:?}", section, sorted_keys(extra)))
    }
}

fn apply_model_patch(dst: &mut CfgModel, src: ModelDto) {
    if let Some(v) = src.num_symbols {
        dst.num_symbols = v;
    }
    if let Some(v) = src.sps {
        dst.sps = v;
    }
    if let Some(v) = src.num_taps {
        dst.num_taps = v;
    }
    if let Some(v) = src.rolloff {
        dst.rolloff = v;
    }
    if let Some(v) = src.seed {
        dst.seed = v;
    }
    if let Some(v) = src.bit_source {
        dst.bit_source = v;
    }
}

fn apply_fixed_point_patch(dst: &mut CfgFixedPoint, src: FixedPointDto) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(f) = src.sample_format {
        dst.sample_format = QFormat::new(f.int_bits, f.frac_bits)?;
    }
    if let Some(f) = src.rx_format {
        dst.rx_format = QFormat::new(f.int_bits, f.frac_bits)?;
    }
    if let Some(r) = src.rounding {
        dst.rounding = r.parse::<Rounding>()?;
    }
    if let Some(v) = src.coeff_peak {
        dst.coeff_peak = v;
    }
    Ok(())
}

fn apply_channel_patch(dst: &mut CfgChannel, src: ChannelDto) {
    if let Some(v) = src.phase_offset_deg {
        dst.phase_offset_deg = v;
    }
    if let Some(v) = src.sample_rate_hz {
        dst.sample_rate_hz = v;
    }

    // Option
    dst.cfo_hz = src.cfo_hz;
    dst.noise_seed = src.noise_seed;

    // `noise = false` wins over any snr_db
    if let Some(v) = src.snr_db {
        dst.snr_db = Some(v);
    }
    if src.noise == Some(false) {
        dst.snr_db = None;
    }
}

fn apply_receiver_patch(dst: &mut CfgReceiver, src: ReceiverDto) {
    if let Some(v) = src.timing {
        dst.timing = v;
    }
    if let Some(v) = src.sampling_offset {
        dst.sampling_offset = v;
    }
    if let Some(v) = src.gardner_gain {
        dst.gardner_gain = v;
    }
    if let Some(v) = src.kp {
        dst.kp = v;
    }
    if let Some(v) = src.ki {
        dst.ki = v;
    }
    if let Some(v) = src.initial_phase_deg {
        dst.initial_phase_deg = v;
    }
    if let Some(v) = src.settle_symbols {
        dst.settle_symbols = v;
    }
    if let Some(v) = src.ambiguity {
        dst.ambiguity = v;
    }
    if let Some(v) = src.pilot_len {
        dst.pilot_len = v;
    }
}

fn apply_output_patch(dst: &mut CfgOutput, src: OutputDto) {
    if let Some(v) = src.vector_dir {
        dst.vector_dir = v;
    }
    if let Some(v) = src.export {
        dst.export = v;
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,

    #[serde(default)]
    model: Option<ModelDto>,

    #[serde(default)]
    fixed_point: Option<FixedPointDto>,

    #[serde(default)]
    channel: Option<ChannelDto>,

    #[serde(default)]
    receiver: Option<ReceiverDto>,

    #[serde(default)]
    output: Option<OutputDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct ModelDto {
    num_symbols: Option<usize>,
    sps: Option<usize>,
    num_taps: Option<usize>,
    rolloff: Option<f64>,
    seed: Option<u64>,
    bit_source: Option<BitSourceKind>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct QFormatDto {
    int_bits: u32,
    frac_bits: u32,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct FixedPointDto {
    sample_format: Option<QFormatDto>,
    rx_format: Option<QFormatDto>,
    rounding: Option<String>,
    coeff_peak: Option<f64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct ChannelDto {
    phase_offset_deg: Option<f64>,
    cfo_hz: Option<f64>,
    sample_rate_hz: Option<f64>,
    snr_db: Option<f64>,
    noise: Option<bool>,
    noise_seed: Option<u64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct ReceiverDto {
    timing: Option<TimingMode>,
    sampling_offset: Option<SamplingOffsetMode>,
    gardner_gain: Option<f64>,
    kp: Option<f64>,
    ki: Option<f64>,
    initial_phase_deg: Option<f64>,
    settle_symbols: Option<usize>,
    ambiguity: Option<AmbiguityMode>,
    pilot_len: Option<usize>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct OutputDto {
    vector_dir: Option<String>,
    export: Option<bool>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
