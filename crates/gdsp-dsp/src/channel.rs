//! Channel impairments: carrier phase/frequency offset and AWGN

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use gdsp_core::sample_consts::PI;
use gdsp_core::{ComplexSample, GdspError, GdspResult, RealSample, mean_power};

/// Default sample rate the frequency offset refers to
pub const DEFAULT_SAMPLE_RATE_HZ: RealSample = 27e6;

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelParams {
    pub phase_offset_deg: RealSample,
    /// Carrier frequency offset. None for a static rotation
    pub cfo_hz: Option<RealSample>,
    pub sample_rate_hz: RealSample,
    /// Target SNR. None for a noiseless channel
    pub snr_db: Option<RealSample>,
    pub noise_seed: u64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            phase_offset_deg: 0.0,
            cfo_hz: None,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            snr_db: None,
            noise_seed: 43,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelOutput {
    pub samples: Vec<ComplexSample>,
    /// Mean |s|^2 of the rotated signal before noise
    pub signal_power: RealSample,
    /// Per-dimension noise variance, 0 when no noise was added
    pub noise_var: RealSample,
    /// SNR realized by the actual noise draws
    pub measured_snr_db: Option<RealSample>,
}

/// Rotate every sample by `phase[n] = phase0 + 2*pi*cfo*n/fs`
pub fn rotate(samples: &[ComplexSample], phase_offset_deg: RealSample, cfo_hz: Option<RealSample>, sample_rate_hz: RealSample) -> Vec<ComplexSample> {
    let phase0 = phase_offset_deg.to_radians();
    match cfo_hz {
        Some(cfo) if cfo != 0.0 => {
            let step = 2.0 * PI * cfo / sample_rate_hz;
            samples
                .iter()
                .enumerate()
                .map(|(n, &s)| s * ComplexSample::from_polar(1.0, phase0 + step * n as RealSample))
                .collect()
        }
        _ => {
            let rot = ComplexSample::from_polar(1.0, phase0);
            samples.iter().map(|&s| s * rot).collect()
        }
    }
}

/// Per-dimension noise variance giving `snr_db` for a signal of mean power `signal_power`
pub fn noise_variance(signal_power: RealSample, snr_db: RealSample) -> RealSample {
    signal_power / (2.0 * 10f64.powf(snr_db / 10.0))
}

pub struct Channel {
    params: ChannelParams,
}

impl Channel {
    pub fn new(params: ChannelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ChannelParams {
        &self.params
    }

    pub fn apply(&self, samples: &[ComplexSample]) -> GdspResult<ChannelOutput> {
        let p = &self.params;
        let mut out = rotate(samples, p.phase_offset_deg, p.cfo_hz, p.sample_rate_hz);
        let signal_power = mean_power(&out);

        let Some(snr_db) = p.snr_db else {
            tracing::debug!("channel: rotation {:.2} deg, no noise", p.phase_offset_deg);
            return Ok(ChannelOutput { samples: out, signal_power, noise_var: 0.0, measured_snr_db: None });
        };

        let noise_var = noise_variance(signal_power, snr_db);
        let noise_dist = Normal::new(0.0, noise_var.sqrt()).map_err(|_| GdspError::NoiseLevel { snr_db, noise_var })?;
        let mut rng = ChaCha8Rng::seed_from_u64(p.noise_seed);

        // I then Q for each sample
        let mut noise_energy = 0.0;
        for s in out.iter_mut() {
            let n = ComplexSample::new(noise_dist.sample(&mut rng), noise_dist.sample(&mut rng));
            noise_energy += n.norm_sqr();
            *s += n;
        }

        let measured_snr_db = if noise_energy > 0.0 {
            Some(10.0 * (signal_power * out.len() as RealSample / noise_energy).log10())
        } else {
            None
        };
        tracing::info!(
            "AWGN: target SNR {:.1} dB, measured {:.1} dB, noise var {:.3e}",
            snr_db,
            measured_snr_db.unwrap_or(RealSample::INFINITY),
            noise_var
        );

        Ok(ChannelOutput { samples: out, signal_power, noise_var, measured_snr_db })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize) -> Vec<ComplexSample> {
        (0..n).map(|k| ComplexSample::from_polar(1.0, 0.1 * k as RealSample)).collect()
    }

    #[test]
    fn test_static_rotation() {
        let x = [ComplexSample::new(1.0, 0.0), ComplexSample::new(0.0, 1.0)];
        let y = rotate(&x, 90.0, None, DEFAULT_SAMPLE_RATE_HZ);
        assert!((y[0] - ComplexSample::new(0.0, 1.0)).norm() < 1e-12);
        assert!((y[1] - ComplexSample::new(-1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_frequency_offset_ramps_phase() {
        let x = vec![ComplexSample::new(1.0, 0.0); 8];
        // fs/4 offset: a quarter turn per sample
        let y = rotate(&x, 0.0, Some(1.0), 4.0);
        assert!((y[1] - ComplexSample::new(0.0, 1.0)).norm() < 1e-12);
        assert!((y[2] - ComplexSample::new(-1.0, 0.0)).norm() < 1e-12);
        assert!((y[5] - ComplexSample::new(0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_noiseless_channel_preserves_power() {
        let x = tone(100);
        let out = Channel::new(ChannelParams { phase_offset_deg: 33.0, ..Default::default() }).apply(&x).unwrap();
        assert_eq!(out.noise_var, 0.0);
        assert!(out.measured_snr_db.is_none());
        assert!((out.signal_power - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_awgn_hits_target_snr() {
        let x = tone(20000);
        let params = ChannelParams { snr_db: Some(15.0), noise_seed: 5, ..Default::default() };
        let out = Channel::new(params.clone()).apply(&x).unwrap();
        assert!((out.noise_var - 1.0 / (2.0 * 10f64.powf(1.5))).abs() < 1e-12);
        let measured = out.measured_snr_db.unwrap();
        assert!((measured - 15.0).abs() < 0.2, "measured {}", measured);

        // Same seed, same noise
        let again = Channel::new(params).apply(&x).unwrap();
        assert_eq!(out.samples, again.samples);
    }

    #[test]
    fn test_noise_is_zero_mean_and_seeded() {
        // Unit power at 0 dB: 0.5 per dimension
        let params = ChannelParams { snr_db: Some(0.0), noise_seed: 9, ..Default::default() };
        let tone_out = Channel::new(params.clone()).apply(&tone(10000)).unwrap();
        let noise: Vec<ComplexSample> = tone_out.samples.iter().zip(tone(10000)).map(|(y, s)| y - s).collect();

        let n = noise.len() as RealSample;
        let mean_i = noise.iter().map(|z| z.re).sum::<RealSample>() / n;
        let mean_q = noise.iter().map(|z| z.im).sum::<RealSample>() / n;
        assert!(mean_i.abs() < 0.05 && mean_q.abs() < 0.05, "mean {} {}", mean_i, mean_q);

        let var_i = noise.iter().map(|z| z.re * z.re).sum::<RealSample>() / n;
        let var_q = noise.iter().map(|z| z.im * z.im).sum::<RealSample>() / n;
        assert!((var_i - 0.5).abs() < 0.05, "I variance {}", var_i);
        assert!((var_q - 0.5).abs() < 0.05, "Q variance {}", var_q);

        let reseeded = ChannelParams { noise_seed: 10, ..params };
        assert_ne!(Channel::new(reseeded).apply(&tone(10000)).unwrap().samples, tone_out.samples);
    }

    #[test]
    fn test_invalid_noise_level_is_rejected() {
        let params = ChannelParams { snr_db: Some(RealSample::NAN), ..Default::default() };
        assert!(matches!(
            Channel::new(params).apply(&tone(16)),
            Err(GdspError::NoiseLevel { .. })
        ));
    }
}
