//! Core utilities for the G-DSP golden model
//!
//! This crate provides the fundamental types shared across the workspace:
//! - Q-format descriptors and the bit-true fixed-point codec
//! - Sample types used by the signal chain
//! - Validation errors
//! - Logging setup and debug macros

pub mod debug;
pub mod dsp_types;
pub mod error;
pub mod fixed_point;

// Re-export commonly used items
pub use dsp_types::*;
pub use error::{GdspError, GdspResult};
pub use fixed_point::{QFormat, Quantized, Rounding, Q1_11, Q2_10};
