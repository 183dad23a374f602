//! Phase-offset sweep
//!
//! Each offset is an independent run with its own config copy, loop state and
//! arrays. Runs are spread over the rayon pool. Sweeps never export vectors.

use rayon::prelude::*;

use gdsp_config::ModelConfig;
use gdsp_core::RealSample;

use crate::error::ModelResult;
use crate::golden_model::GoldenModel;
use crate::report::RunReport;

#[derive(Debug)]
pub struct SweepPoint {
    pub phase_offset_deg: RealSample,
    pub report: ModelResult<RunReport>,
}

/// Run `base` once per offset. Results keep the order of `offsets_deg`.
pub fn sweep_phase_offsets(base: &ModelConfig, offsets_deg: &[RealSample]) -> Vec<SweepPoint> {
    tracing::info!("phase sweep over {} offsets", offsets_deg.len());
    offsets_deg
        .par_iter()
        .map(|&deg| {
            let mut cfg = base.clone();
            cfg.channel.phase_offset_deg = deg;
            let report = GoldenModel::new(cfg).and_then(|model| model.evaluate());
            if let Ok(r) = &report {
                tracing::debug!("sweep {:+.1} deg: accuracy {:.4}", deg, r.accuracy());
            }
            SweepPoint { phase_offset_deg: deg, report }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_matches_sequential_runs() {
        let mut cfg = ModelConfig::default();
        cfg.model.num_symbols = 200;
        cfg.channel.snr_db = None;

        let offsets = [0.0, 10.0, -15.0];
        let points = sweep_phase_offsets(&cfg, &offsets);
        assert_eq!(points.len(), 3);

        for (p, &deg) in points.iter().zip(&offsets) {
            assert_eq!(p.phase_offset_deg, deg);
            let swept = p.report.as_ref().unwrap();

            let mut single = cfg.clone();
            single.channel.phase_offset_deg = deg;
            let direct = GoldenModel::new(single).unwrap().evaluate().unwrap();
            assert_eq!(swept.final_phase_deg, direct.final_phase_deg);
            assert_eq!(swept.rotation, direct.rotation);
            assert!(swept.exported.is_empty());
        }
    }

    #[test]
    fn test_wide_sweep_keeps_input_order() {
        let mut cfg = ModelConfig::default();
        cfg.model.num_symbols = 64;
        cfg.channel.snr_db = None;
        cfg.receiver.settle_symbols = 16;

        let offsets: Vec<RealSample> = (0..360).map(|d| d as RealSample - 180.0).collect();
        let points = sweep_phase_offsets(&cfg, &offsets);
        assert_eq!(points.len(), 360);
        assert!(points.iter().zip(&offsets).all(|(p, &deg)| p.phase_offset_deg == deg));
        assert!(points.iter().all(|p| p.report.is_ok()));
    }

    #[test]
    fn test_sweep_reports_invalid_config_per_point() {
        let mut cfg = ModelConfig::default();
        cfg.model.num_taps = 8;
        let points = sweep_phase_offsets(&cfg, &[0.0, 90.0]);
        assert!(points.iter().all(|p| p.report.is_err()));
    }
}
