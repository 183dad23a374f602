//! Bit-true fixed-point codec
//!
//! A `QFormat` describes a signed two's-complement number with `int_bits`
//! integer bits (sign included) and `frac_bits` fractional bits. Every
//! quantized value in the golden model goes through `quantize_value`, which is
//! the single place where rounding and saturation happen.

use core::fmt;
use std::str::FromStr;

use crate::error::{GdspError, GdspResult};

/// Signed Q-format descriptor. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QFormat {
    int_bits: u32,
    frac_bits: u32,
}

/// 12-bit sample and coefficient format
pub const Q1_11: QFormat = QFormat { int_bits: 1, frac_bits: 11 };
/// 12-bit receiver stage format, one extra bit of headroom
pub const Q2_10: QFormat = QFormat { int_bits: 2, frac_bits: 10 };

impl QFormat {
    pub const MAX_TOTAL_BITS: u32 = 32;

    pub fn new(int_bits: u32, frac_bits: u32) -> GdspResult<Self> {
        if int_bits < 1 {
            return Err(GdspError::InvalidFormat { int_bits, frac_bits, reason: "need at least the sign bit" });
        }
        if int_bits + frac_bits > Self::MAX_TOTAL_BITS {
            return Err(GdspError::InvalidFormat { int_bits, frac_bits, reason: "wider than 32 bits" });
        }
        Ok(Self { int_bits, frac_bits })
    }

    pub const fn int_bits(&self) -> u32 {
        self.int_bits
    }

    pub const fn frac_bits(&self) -> u32 {
        self.frac_bits
    }

    pub const fn total_bits(&self) -> u32 {
        self.int_bits + self.frac_bits
    }

    /// 2^frac_bits
    pub fn scale(&self) -> f64 {
        (1u64 << self.frac_bits) as f64
    }

    /// Value of one LSB
    pub fn resolution(&self) -> f64 {
        1.0 / self.scale()
    }

    pub const fn min_code(&self) -> i64 {
        -(1i64 << (self.total_bits() - 1))
    }

    pub const fn max_code(&self) -> i64 {
        (1i64 << (self.total_bits() - 1)) - 1
    }

    pub fn min_value(&self) -> f64 {
        self.min_code() as f64 / self.scale()
    }

    pub fn max_value(&self) -> f64 {
        self.max_code() as f64 / self.scale()
    }

    /// Hex digits needed to hold one code
    pub const fn hex_digits(&self) -> usize {
        self.total_bits().div_ceil(4) as usize
    }
}

impl fmt::Display for QFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}.{} ({}-bit signed)", self.int_bits, self.frac_bits, self.total_bits())
    }
}

/// Rounding applied to the scaled value before saturation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Toward negative infinity (plain truncation of two's complement)
    Floor,
    /// To nearest, ties away from zero
    Nearest,
    /// To nearest, ties to even
    #[default]
    Convergent,
}

impl Rounding {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Rounding::Floor => x.floor(),
            Rounding::Nearest => x.round(),
            Rounding::Convergent => x.round_ties_even(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rounding::Floor => "floor",
            Rounding::Nearest => "nearest",
            Rounding::Convergent => "convergent",
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rounding {
    type Err = GdspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "floor" => Ok(Rounding::Floor),
            "nearest" | "round" => Ok(Rounding::Nearest),
            "convergent" | "half-even" | "round-half-to-even" => Ok(Rounding::Convergent),
            _ => Err(GdspError::UnknownRounding(s.to_string())),
        }
    }
}

/// Integer codes produced by `quantize`, plus the number of inputs that had to be clamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantized {
    pub codes: Vec<i32>,
    pub saturated: usize,
}

/// Quantize a single value. Returns the code and whether it was clamped.
/// NaN maps to code 0.
pub fn quantize_value(x: f64, format: QFormat, rounding: Rounding) -> (i32, bool) {
    let scaled = rounding.apply(x * format.scale());
    if scaled.is_nan() {
        return (0, false);
    }
    let (min, max) = (format.min_code(), format.max_code());
    if scaled > max as f64 {
        (max as i32, true)
    } else if scaled < min as f64 {
        (min as i32, true)
    } else {
        (scaled as i32, false)
    }
}

/// Quantize a slice. Saturation is not an error: values are clamped, counted and logged.
pub fn quantize(values: &[f64], format: QFormat, rounding: Rounding) -> Quantized {
    let mut saturated = 0;
    let codes = values
        .iter()
        .map(|&x| {
            let (code, clamped) = quantize_value(x, format, rounding);
            saturated += clamped as usize;
            code
        })
        .collect();

    if saturated > 0 {
        tracing::warn!("{} of {} values saturated when quantizing to {}", saturated, values.len(), format);
    }
    Quantized { codes, saturated }
}

pub fn dequantize_value(code: i32, format: QFormat) -> f64 {
    code as f64 / format.scale()
}

pub fn dequantize(codes: &[i32], format: QFormat) -> Vec<f64> {
    codes.iter().map(|&c| dequantize_value(c, format)).collect()
}

/// Unsigned bit pattern of `value` in a `bit_width`-bit two's-complement word.
/// Bits above the word are dropped.
pub fn to_unsigned_twos_complement(value: i64, bit_width: u32) -> u64 {
    debug_assert!((1..=64).contains(&bit_width), "bit width {} outside 1..=64", bit_width);
    (value as u64) & (u64::MAX >> (64 - bit_width))
}

/// Sign-extend a `bit_width`-bit two's-complement pattern
pub fn from_unsigned_twos_complement(raw: u64, bit_width: u32) -> i64 {
    debug_assert!((1..=64).contains(&bit_width), "bit width {} outside 1..=64", bit_width);
    let unused = 64 - bit_width;
    ((raw << unused) as i64) >> unused
}
