//! Quadrant ambiguity of the carrier loop
//!
//! The Costas loop can lock with the constellation turned by any multiple of
//! 90 degrees. `best_rotation` measures which turn fits a known reference
//! (diagnostics and tests). `QuadrantResolver` implementations pick a turn at
//! run time and undo it.

use gdsp_core::{ComplexSample, GdspError, GdspResult, RealSample};

use crate::qam16;

/// Multiply by i^k, exact for every k
pub fn rotate_quarter_turns(s: ComplexSample, quarter_turns: u8) -> ComplexSample {
    match quarter_turns % 4 {
        0 => s,
        1 => ComplexSample::new(-s.im, s.re),
        2 => ComplexSample::new(-s.re, -s.im),
        _ => ComplexSample::new(s.im, -s.re),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationMatch {
    /// Turns (multiples of 90 degrees, counter-clockwise) applied to the demodulated stream
    pub quarter_turns: u8,
    pub matches: usize,
    pub compared: usize,
}

impl RotationMatch {
    pub fn accuracy(&self) -> RealSample {
        if self.compared == 0 {
            return 0.0;
        }
        self.matches as RealSample / self.compared as RealSample
    }
}

fn aligned_pairs(
    demod: &[ComplexSample],
    reference: &[ComplexSample],
    lag: usize,
    settle: usize,
) -> Vec<(ComplexSample, ComplexSample)> {
    demod
        .iter()
        .enumerate()
        .skip(settle)
        .map_while(|(k, &d)| reference.get(k + lag).map(|&r| (d, r)))
        .collect()
}

fn count_matches(pairs: &[(ComplexSample, ComplexSample)], quarter_turns: u8, tolerance: RealSample) -> RotationMatch {
    let matches = pairs
        .iter()
        .filter(|(d, r)| {
            let e = rotate_quarter_turns(*d, quarter_turns) - r;
            e.re.abs() < tolerance && e.im.abs() < tolerance
        })
        .count();
    RotationMatch { quarter_turns, matches, compared: pairs.len() }
}

/// Score one fixed turn. Same alignment rules as `best_rotation`.
pub fn rotation_match(
    demod: &[ComplexSample],
    reference: &[ComplexSample],
    lag: usize,
    settle: usize,
    tolerance: RealSample,
    quarter_turns: u8,
) -> RotationMatch {
    count_matches(&aligned_pairs(demod, reference, lag, settle), quarter_turns % 4, tolerance)
}

/// Try all four turns of `demod` against `reference`.
///
/// `demod[k]` is compared with `reference[k + lag]` for `k >= settle`. A symbol
/// matches when both axes are within `tolerance`.
pub fn best_rotation(
    demod: &[ComplexSample],
    reference: &[ComplexSample],
    lag: usize,
    settle: usize,
    tolerance: RealSample,
) -> RotationMatch {
    let pairs = aligned_pairs(demod, reference, lag, settle);

    (0..4u8)
        .map(|quarter_turns| count_matches(&pairs, quarter_turns, tolerance))
        // First maximum wins, so an unrotated stream is preferred on ties
        .fold(None, |best: Option<RotationMatch>, m| match best {
            Some(b) if b.matches >= m.matches => Some(b),
            _ => Some(m),
        })
        .unwrap_or(RotationMatch { quarter_turns: 0, matches: 0, compared: 0 })
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub quarter_turns: u8,
    /// Whole stream with the chosen turn applied
    pub symbols: Vec<ComplexSample>,
    /// Pilot symbols whose hard decision agreed after the turn
    pub pilot_matches: usize,
}

pub trait QuadrantResolver {
    fn resolve(&self, demod: &[ComplexSample]) -> GdspResult<Resolution>;
}

/// Chooses the turn that makes a known pilot window decode correctly
pub struct PilotQuadrantResolver {
    pilots: Vec<ComplexSample>,
    /// Index in the demodulated stream where the pilots appear
    position: usize,
}

impl PilotQuadrantResolver {
    pub fn new(pilots: Vec<ComplexSample>, position: usize) -> Self {
        Self { pilots, position }
    }
}

impl QuadrantResolver for PilotQuadrantResolver {
    fn resolve(&self, demod: &[ComplexSample]) -> GdspResult<Resolution> {
        let end = self.position + self.pilots.len();
        let window = demod.get(self.position..end).ok_or(GdspError::PilotWindow {
            start: self.position,
            end,
            len: demod.len(),
        })?;

        let expected: Vec<u8> = self.pilots.iter().map(|&p| qam16::demap(p)).collect();
        let (quarter_turns, pilot_matches) = (0..4u8)
            .map(|k| {
                let hits = window
                    .iter()
                    .zip(&expected)
                    .filter(|&(&s, &nibble)| qam16::demap(rotate_quarter_turns(s, k)) == nibble)
                    .count();
                (k, hits)
            })
            .fold((0u8, 0usize), |best, cur| if cur.1 > best.1 { cur } else { best });

        if pilot_matches * 2 < self.pilots.len() {
            tracing::warn!(
                "pilot resolver: best turn {} only matches {}/{} pilots",
                quarter_turns,
                pilot_matches,
                self.pilots.len()
            );
        } else {
            tracing::debug!("pilot resolver: {} quarter turns, {}/{} pilots", quarter_turns, pilot_matches, self.pilots.len());
        }

        let symbols = demod.iter().map(|&s| rotate_quarter_turns(s, quarter_turns)).collect();
        Ok(Resolution { quarter_turns, symbols, pilot_matches })
    }
}
