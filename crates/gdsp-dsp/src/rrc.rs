//! Root-raised-cosine pulse synthesis and coefficient quantization

use gdsp_core::fixed_point::{self, QFormat, Rounding};
use gdsp_core::sample_consts::{PI, SQRT_2};
use gdsp_core::{GdspError, GdspResult, RealSample};

/// Peak coefficient magnitude after scaling, leaves headroom in Q1.11
pub const DEFAULT_COEFF_PEAK: RealSample = 0.45;

/// Distance below which a time instant is treated as one of the singular points
const SINGULAR_EPS: RealSample = 1e-12;

/// Design an odd-length, symmetric, unit-energy RRC filter.
///
/// Tap `n` sits at `t = (n - (N-1)/2) / sps` symbol periods from the centre.
/// The closed form has removable singularities at `t = 0` and `|t| = 1/(4α)`,
/// both evaluated from their limits.
pub fn design_rrc(num_taps: usize, sps: usize, alpha: RealSample) -> GdspResult<Vec<RealSample>> {
    if num_taps % 2 == 0 {
        return Err(GdspError::EvenTapCount { num_taps });
    }
    if sps == 0 {
        return Err(GdspError::InvalidSps);
    }
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(GdspError::InvalidRolloff { alpha });
    }

    let center = (num_taps - 1) as RealSample / 2.0;
    let mut h: Vec<RealSample> = (0..num_taps)
        .map(|n| rrc_at((n as RealSample - center) / sps as RealSample, alpha))
        .collect();

    let norm = energy(&h).sqrt();
    for x in h.iter_mut() {
        *x /= norm;
    }

    tracing::debug!(
        "RRC {} taps, sps={}, alpha={}: symmetry err {:.2e}",
        num_taps,
        sps,
        alpha,
        symmetry_error(&h)
    );
    Ok(h)
}

/// Unnormalized RRC impulse response at `t` symbol periods
fn rrc_at(t: RealSample, alpha: RealSample) -> RealSample {
    if t.abs() < SINGULAR_EPS {
        1.0 - alpha + 4.0 * alpha / PI
    } else if (t.abs() - 1.0 / (4.0 * alpha)).abs() < SINGULAR_EPS {
        let arg = PI / (4.0 * alpha);
        (alpha / SQRT_2) * ((1.0 + 2.0 / PI) * arg.sin() + (1.0 - 2.0 / PI) * arg.cos())
    } else {
        let num = (PI * t * (1.0 - alpha)).sin() + 4.0 * alpha * t * (PI * t * (1.0 + alpha)).cos();
        let den = PI * t * (1.0 - (4.0 * alpha * t).powi(2));
        num / den
    }
}

/// Sum of squared taps
pub fn energy(h: &[RealSample]) -> RealSample {
    h.iter().map(|x| x * x).sum()
}

/// max |h[n] - h[N-1-n]|
pub fn symmetry_error(h: &[RealSample]) -> RealSample {
    h.iter()
        .zip(h.iter().rev())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, RealSample::max)
}

/// Fixed-point coefficient set together with its quantization statistics
#[derive(Debug, Clone)]
pub struct QuantizedTaps {
    pub format: QFormat,
    /// Gain applied to the unit-energy taps before quantization
    pub scale_factor: RealSample,
    /// Scaled floating-point taps, the reference for the error figures
    pub scaled: Vec<RealSample>,
    pub codes: Vec<i32>,
    /// Codes converted back to real values; these are the taps the signal chain runs with
    pub reconstructed: Vec<RealSample>,
    pub saturated: usize,
    pub sqnr_db: RealSample,
    pub max_error: RealSample,
}

/// Scale `h` so that its largest magnitude equals `peak_target`, then quantize.
pub fn quantize_taps(h: &[RealSample], format: QFormat, rounding: Rounding, peak_target: RealSample) -> QuantizedTaps {
    let peak = h.iter().fold(0.0, |m: RealSample, x| m.max(x.abs()));
    let scale_factor = if peak > 0.0 { peak_target / peak } else { 1.0 };
    let scaled: Vec<RealSample> = h.iter().map(|x| x * scale_factor).collect();

    let q = fixed_point::quantize(&scaled, format, rounding);
    let reconstructed = fixed_point::dequantize(&q.codes, format);

    let noise: RealSample = scaled.iter().zip(&reconstructed).map(|(a, b)| (a - b).powi(2)).sum();
    let max_error = scaled
        .iter()
        .zip(&reconstructed)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, RealSample::max);
    let sqnr_db = if noise > 0.0 {
        10.0 * (energy(&scaled) / noise).log10()
    } else {
        RealSample::INFINITY
    };

    tracing::info!(
        "coefficients in {}: scale {:.6}, SQNR {:.1} dB, max error {:.2e}",
        format,
        scale_factor,
        sqnr_db,
        max_error
    );

    QuantizedTaps {
        format,
        scale_factor,
        scaled,
        codes: q.codes,
        reconstructed,
        saturated: q.saturated,
        sqnr_db,
        max_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsp_core::Q1_11;
    use proptest::prelude::*;

    #[test]
    fn test_rrc_symmetric_unit_energy() {
        for &(n, sps, alpha) in &[(33, 4, 0.25), (5, 4, 0.35), (65, 8, 0.5), (33, 4, 1.0), (1, 4, 0.25)] {
            let h = design_rrc(n, sps, alpha).unwrap();
            assert_eq!(h.len(), n);
            assert!(symmetry_error(&h) < 1e-9, "asymmetric for {:?}", (n, sps, alpha));
            assert!((energy(&h) - 1.0).abs() < 1e-9, "energy off for {:?}", (n, sps, alpha));
        }
    }

    #[test]
    fn test_rrc_peak_at_center() {
        let h = design_rrc(33, 4, 0.25).unwrap();
        let peak_idx = h
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_idx, 16);
    }

    #[test]
    fn test_rrc_singular_point_is_finite() {
        // alpha = 0.25, sps = 4: |t| = 1/(4*alpha) = 1 falls exactly on taps 12 and 20
        let h = design_rrc(33, 4, 0.25).unwrap();
        assert!(h.iter().all(|x| x.is_finite()));

        // The singular tap agrees with the general formula evaluated just beside it
        let raw_at = rrc_at(1.0, 0.25);
        let raw_near = rrc_at(1.0 + 1e-6, 0.25);
        assert!((raw_at - raw_near).abs() < 1e-4, "{} vs {}", raw_at, raw_near);
    }

    #[test]
    fn test_rrc_rejects_bad_parameters() {
        assert_eq!(design_rrc(32, 4, 0.25), Err(GdspError::EvenTapCount { num_taps: 32 }));
        assert_eq!(design_rrc(33, 4, 0.0), Err(GdspError::InvalidRolloff { alpha: 0.0 }));
        assert_eq!(design_rrc(33, 4, 1.5), Err(GdspError::InvalidRolloff { alpha: 1.5 }));
        assert!(design_rrc(33, 4, RealSample::NAN).is_err());
        assert_eq!(design_rrc(33, 0, 0.25), Err(GdspError::InvalidSps));
    }

    #[test]
    fn test_quantize_taps() {
        let h = design_rrc(33, 4, 0.25).unwrap();
        let q = quantize_taps(&h, Q1_11, Rounding::Nearest, DEFAULT_COEFF_PEAK);

        assert_eq!(q.codes.len(), 33);
        assert_eq!(q.saturated, 0);
        // 0.45 * 2048 = 921.6 rounds to 922
        assert_eq!(q.codes[16], 922);
        assert!(q.max_error <= Q1_11.resolution() / 2.0 + 1e-15);
        assert!(q.sqnr_db > 40.0, "SQNR {}", q.sqnr_db);
        // Quantization keeps the symmetry exactly
        assert!(symmetry_error(&q.reconstructed) == 0.0);
    }

    proptest! {
        #[test]
        fn prop_rrc_symmetric_unit_energy(half in 1usize..=32, sps in 1usize..=8, alpha in 0.01f64..=1.0) {
            let n = 2 * half + 1;
            let h = design_rrc(n, sps, alpha).unwrap();
            prop_assert_eq!(h.len(), n);
            prop_assert!(h.iter().all(|x| x.is_finite()));
            prop_assert!(symmetry_error(&h) < 1e-9, "asymmetry {:e}", symmetry_error(&h));
            prop_assert!((energy(&h) - 1.0).abs() < 1e-9, "energy {}", energy(&h));
        }

        #[test]
        fn prop_quantized_taps_stay_symmetric(half in 1usize..=32, sps in 1usize..=8, alpha in 0.01f64..=1.0) {
            let h = design_rrc(2 * half + 1, sps, alpha).unwrap();
            let q = quantize_taps(&h, Q1_11, Rounding::Convergent, DEFAULT_COEFF_PEAK);
            prop_assert_eq!(q.saturated, 0);
            prop_assert!(symmetry_error(&q.reconstructed) == 0.0);
        }
    }
}
