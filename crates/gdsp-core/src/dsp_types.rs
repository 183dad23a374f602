//! Data types used for signal processing

pub type RealSample = f64;
pub use std::f64::consts as sample_consts;

pub type ComplexSample = num_complex::Complex<RealSample>;

/// Split a complex stream into separate I and Q rails, as exported to hardware.
pub fn split_iq(samples: &[ComplexSample]) -> (Vec<RealSample>, Vec<RealSample>) {
    samples.iter().map(|s| (s.re, s.im)).unzip()
}

/// Mean of |s|^2 over the stream. Zero for an empty stream.
pub fn mean_power(samples: &[ComplexSample]) -> RealSample {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.norm_sqr()).sum::<RealSample>() / samples.len() as RealSample
}
