//! End-to-end 16-QAM golden model
//!
//! Wires the signal-chain blocks from `gdsp-dsp` into one deterministic run,
//! hands the quantized stage outputs to a `VectorSink` and summarizes the run
//! in a `RunReport`.

pub mod error;
pub mod golden_model;
pub mod report;
pub mod sweep;

pub use error::{ModelError, ModelResult};
pub use golden_model::{GoldenModel, QuantizedStream, RunArtifacts};
pub use report::RunReport;
pub use sweep::{SweepPoint, sweep_phase_offsets};
