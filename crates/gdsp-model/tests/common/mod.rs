use gdsp_config::ModelConfig;

/// Creates a noiseless 500-symbol config for testing. It can still be modified
/// as needed before building the model.
pub fn default_test_config() -> ModelConfig {
    let mut cfg = ModelConfig::default();
    cfg.model.num_symbols = 500;
    cfg.channel.snr_db = None;
    cfg
}

#[allow(dead_code)]
pub fn config_with_offset(phase_offset_deg: f64) -> ModelConfig {
    let mut cfg = default_test_config();
    cfg.channel.phase_offset_deg = phase_offset_deg;
    cfg
}

/// Data lines of a hex or mem record, comments stripped
#[allow(dead_code)]
pub fn data_lines(record: &str) -> Vec<&str> {
    record.lines().filter(|l| !l.starts_with("//")).collect()
}
