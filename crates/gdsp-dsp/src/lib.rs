//! Signal-chain building blocks of the 16-QAM golden model
//!
//! Leaf-first: bit sources and the Gray mapper, RRC synthesis and FIR
//! filtering, the channel model, matched filtering, timing recovery, the
//! Costas carrier loop and quadrant resolution. Everything here is a pure
//! batch function or a small state machine owned by a single run.

pub mod ambiguity;
pub mod bit_source;
pub mod channel;
pub mod costas;
pub mod fir;
pub mod matched_filter;
pub mod qam16;
pub mod rrc;
pub mod timing;

pub use ambiguity::{PilotQuadrantResolver, QuadrantResolver, Resolution, RotationMatch, best_rotation, rotation_match};
pub use bit_source::BitSource;
pub use channel::{Channel, ChannelOutput, ChannelParams};
pub use costas::{CostasLoop, CostasOutput, LoopGains};
pub use matched_filter::{IsiReport, MatchedFilter, isi_report};
pub use rrc::{QuantizedTaps, design_rrc, quantize_taps};
pub use timing::{FixedOffsetSampler, GardnerTimingRecovery, SamplingOffset, TimingRecovery};
