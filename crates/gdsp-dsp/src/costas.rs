//! Decision-directed carrier recovery for 16-QAM
//!
//! Per symbol the loop de-rotates by the current phase estimate, slices to the
//! nearest constellation point and measures the angle between the two with a
//! cross product scaled by the decision energy, so every ring pulls with the
//! same weight. A proportional-integral filter turns that error into a phase
//! and frequency update.
//!
//! The detector has a 90 degree symmetry, so the loop settles on one of four
//! equivalent phases. Resolving which one is left to `ambiguity`.

use gdsp_core::sample_consts::{PI, TAU};
use gdsp_core::{ComplexSample, RealSample};

use crate::qam16;

pub const DEFAULT_KP: RealSample = 0.1;
pub const DEFAULT_KI: RealSample = 0.01;

/// Wrap an angle into (-pi, pi]
pub fn wrap_phase(theta: RealSample) -> RealSample {
    if theta > -PI && theta <= PI {
        return theta;
    }
    PI - (PI - theta).rem_euclid(TAU)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopGains {
    pub kp: RealSample,
    pub ki: RealSample,
}

impl Default for LoopGains {
    fn default() -> Self {
        Self { kp: DEFAULT_KP, ki: DEFAULT_KI }
    }
}

/// Loop output with per-symbol traces
#[derive(Debug, Clone, Default)]
pub struct CostasOutput {
    pub symbols: Vec<ComplexSample>,
    /// Phase estimate after each update, radians
    pub phase_trace: Vec<RealSample>,
    /// Frequency (integrator) state after each update, radians per symbol
    pub freq_trace: Vec<RealSample>,
    pub error_trace: Vec<RealSample>,
}

impl CostasOutput {
    /// Mean of the last `n` error samples, 0 for an empty trace
    pub fn trailing_error_mean(&self, n: usize) -> RealSample {
        let tail = &self.error_trace[self.error_trace.len().saturating_sub(n)..];
        if tail.is_empty() {
            return 0.0;
        }
        tail.iter().sum::<RealSample>() / tail.len() as RealSample
    }
}

pub struct CostasLoop {
    gains: LoopGains,
    /// Phase estimate, kept in (-pi, pi]
    theta: RealSample,
    /// Frequency estimate
    omega: RealSample,
}

impl CostasLoop {
    pub fn new(gains: LoopGains, initial_phase: RealSample) -> Self {
        Self { gains, theta: wrap_phase(initial_phase), omega: 0.0 }
    }

    pub fn phase(&self) -> RealSample {
        self.theta
    }

    pub fn frequency(&self) -> RealSample {
        self.omega
    }

    /// Positive when the de-rotated symbol leads its decision. Close to lock
    /// this is the sine of the angle between them, whatever the ring.
    fn phase_error(rotated: ComplexSample) -> RealSample {
        let decision = qam16::slice(rotated);
        // The slicer never returns the origin
        (rotated.im * decision.re - rotated.re * decision.im) / decision.norm_sqr()
    }

    /// Process one symbol. Returns the de-rotated symbol and the detector output.
    pub fn step(&mut self, sample: ComplexSample) -> (ComplexSample, RealSample) {
        let rotated = sample * ComplexSample::from_polar(1.0, -self.theta);
        let err = Self::phase_error(rotated);

        self.omega += self.gains.ki * err;
        self.theta = wrap_phase(self.theta + (self.omega + self.gains.kp * err));

        (rotated, err)
    }

    pub fn run(&mut self, samples: &[ComplexSample]) -> CostasOutput {
        let mut out = CostasOutput {
            symbols: Vec::with_capacity(samples.len()),
            phase_trace: Vec::with_capacity(samples.len()),
            freq_trace: Vec::with_capacity(samples.len()),
            error_trace: Vec::with_capacity(samples.len()),
        };
        for &s in samples {
            let (rotated, err) = self.step(s);
            out.symbols.push(rotated);
            out.phase_trace.push(self.theta);
            out.freq_trace.push(self.omega);
            out.error_trace.push(err);
        }
        tracing::debug!(
            "costas: {} symbols, final phase {:.3} deg, freq {:.3e} rad/sym",
            samples.len(),
            self.theta.to_degrees(),
            self.omega
        );
        out
    }
}
