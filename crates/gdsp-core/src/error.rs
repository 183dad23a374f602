//! Validation errors raised by the signal chain before any computation starts

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GdspError {
    #[error("bit sequence length {len} is not a multiple of 4")]
    BitLength { len: usize },

    #[error("bit {index} has value {value}, expected 0 or 1")]
    NonBinaryBit { index: usize, value: u8 },

    #[error("RRC filter needs an odd tap count, got {num_taps}")]
    EvenTapCount { num_taps: usize },

    #[error("roll-off factor must satisfy 0 < alpha <= 1, got {alpha}")]
    InvalidRolloff { alpha: f64 },

    #[error("samples per symbol must be at least 1")]
    InvalidSps,

    #[error("unrecognized rounding mode: {0}")]
    UnknownRounding(String),

    #[error("invalid format Q{int_bits}.{frac_bits}: {reason}")]
    InvalidFormat {
        int_bits: u32,
        frac_bits: u32,
        reason: &'static str,
    },

    #[error("I/Q length mismatch: {i_len} in-phase vs {q_len} quadrature samples")]
    IqLengthMismatch { i_len: usize, q_len: usize },

    #[error("SNR {snr_db} dB gives no usable noise level (variance {noise_var})")]
    NoiseLevel { snr_db: f64, noise_var: f64 },

    #[error("pilot window {start}..{end} does not fit a stream of {len} symbols")]
    PilotWindow { start: usize, end: usize, len: usize },
}

pub type GdspResult<T> = Result<T, GdspError>;
