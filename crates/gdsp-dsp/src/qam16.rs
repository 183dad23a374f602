use gdsp_core::{ComplexSample, GdspError, GdspResult, RealSample};

/// 1/sqrt(10): normalizes the {-3,-1,+1,+3} grid to unit mean symbol power
pub const QAM16_NORM: RealSample = 0.316_227_766_016_837_94;

/// Decision threshold between inner and outer levels, 2/sqrt(10)
pub const SLICER_THRESHOLD: RealSample = 2.0 * QAM16_NORM;

/// Gray-coded axis level, indexed by the 2-bit code.
/// 00 -> -3, 01 -> -1, 11 -> +1, 10 -> +3
pub const GRAY_LEVELS: [i8; 4] = [-3, -1, 3, 1];

/// Map one 4-bit symbol to its normalized constellation point.
/// Bits 3..2 select I, bits 1..0 select Q.
pub fn map_nibble(nibble: u8) -> ComplexSample {
    let i = GRAY_LEVELS[((nibble >> 2) & 0x3) as usize];
    let q = GRAY_LEVELS[(nibble & 0x3) as usize];
    ComplexSample::new(i as RealSample * QAM16_NORM, q as RealSample * QAM16_NORM)
}

/// Map a bit stream (one bit per byte, values 0 or 1) to symbols, four bits
/// per symbol, first bit most significant.
pub fn bits_to_symbols(bits: &[u8]) -> GdspResult<Vec<ComplexSample>> {
    if bits.len() % 4 != 0 {
        return Err(GdspError::BitLength { len: bits.len() });
    }
    if let Some((index, &value)) = bits.iter().enumerate().find(|(_, b)| **b > 1) {
        return Err(GdspError::NonBinaryBit { index, value });
    }

    let symbols = bits
        .chunks_exact(4)
        .map(|b| map_nibble(b[0] << 3 | b[1] << 2 | b[2] << 1 | b[3]))
        .collect();
    Ok(symbols)
}

/// Nearest Gray level on one axis, in normalized units. Zero goes to the positive side.
pub fn slice_axis(x: RealSample) -> RealSample {
    let level = if x < -SLICER_THRESHOLD {
        -3.0
    } else if x < 0.0 {
        -1.0
    } else if x < SLICER_THRESHOLD {
        1.0
    } else {
        3.0
    };
    level * QAM16_NORM
}

/// Hard decision on both axes
pub fn slice(s: ComplexSample) -> ComplexSample {
    ComplexSample::new(slice_axis(s.re), slice_axis(s.im))
}

fn axis_code(x: RealSample) -> u8 {
    let level = (slice_axis(x) / QAM16_NORM).round() as i8;
    // GRAY_LEVELS is a permutation, so the level always has an index
    GRAY_LEVELS.iter().position(|&l| l == level).unwrap_or(0) as u8
}

/// Nibble of the constellation point nearest to `s`
pub fn demap(s: ComplexSample) -> u8 {
    axis_code(s.re) << 2 | axis_code(s.im)
}

/// Hard-decision demapping back to a bit stream
pub fn symbols_to_bits(symbols: &[ComplexSample]) -> Vec<u8> {
    symbols
        .iter()
        .flat_map(|&s| {
            let n = demap(s);
            [(n >> 3) & 1, (n >> 2) & 1, (n >> 1) & 1, n & 1]
        })
        .collect()
}

/// All 16 points, ordered by nibble value
pub fn constellation() -> [ComplexSample; 16] {
    core::array::from_fn(|n| map_nibble(n as u8))
}

/// Log the mapping table, one row per nibble
pub fn log_constellation() {
    for (n, p) in constellation().iter().enumerate() {
        tracing::debug!(
            "{:04b} -> I={:+}  Q={:+}  ({:+.4}, {:+.4})",
            n,
            (p.re / QAM16_NORM).round(),
            (p.im / QAM16_NORM).round(),
            p.re,
            p.im
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gray_table() {
        assert_eq!(map_nibble(0b0000), ComplexSample::new(-3.0 * QAM16_NORM, -3.0 * QAM16_NORM));
        assert_eq!(map_nibble(0b1011), ComplexSample::new(3.0 * QAM16_NORM, 1.0 * QAM16_NORM));
        assert_eq!(map_nibble(0b0110), ComplexSample::new(-1.0 * QAM16_NORM, 3.0 * QAM16_NORM));
        assert_eq!(map_nibble(0b1101), ComplexSample::new(1.0 * QAM16_NORM, -1.0 * QAM16_NORM));
    }

    #[test]
    fn test_mapping_is_bijective() {
        let points = constellation();
        for a in 0..16 {
            assert_eq!(demap(points[a]) as usize, a);
            for b in (a + 1)..16 {
                assert!((points[a] - points[b]).norm() > 1e-9, "{} and {} collide", a, b);
            }
        }
    }

    #[test]
    fn test_gray_adjacency() {
        // Neighbouring levels on an axis differ in exactly one bit
        let mut codes: Vec<(i8, u8)> = GRAY_LEVELS.iter().enumerate().map(|(c, &l)| (l, c as u8)).collect();
        codes.sort();
        for pair in codes.windows(2) {
            assert_eq!((pair[0].1 ^ pair[1].1).count_ones(), 1, "{:?}", pair);
        }
    }

    #[test]
    fn test_unit_mean_power() {
        let power: RealSample = constellation().iter().map(|p| p.norm_sqr()).sum::<RealSample>() / 16.0;
        assert!((power - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bits_to_symbols() {
        let bits = [1, 0, 1, 1, 0, 0, 0, 0];
        let syms = bits_to_symbols(&bits).unwrap();
        assert_eq!(syms, vec![map_nibble(0b1011), map_nibble(0b0000)]);
        assert_eq!(symbols_to_bits(&syms), bits.to_vec());
    }

    #[test]
    fn test_bits_length_must_be_multiple_of_four() {
        assert_eq!(bits_to_symbols(&[0, 1, 1]), Err(GdspError::BitLength { len: 3 }));
        assert_eq!(bits_to_symbols(&[0, 1, 2, 0]), Err(GdspError::NonBinaryBit { index: 2, value: 2 }));
        assert_eq!(bits_to_symbols(&[]).unwrap().len(), 0);
    }

    #[test]
    fn test_slicer_thresholds() {
        assert_eq!(slice_axis(0.0), QAM16_NORM);
        assert_eq!(slice_axis(-1e-9), -QAM16_NORM);
        assert_eq!(slice_axis(SLICER_THRESHOLD), 3.0 * QAM16_NORM);
        assert_eq!(slice_axis(-SLICER_THRESHOLD), -QAM16_NORM);
        assert_eq!(slice_axis(-5.0), -3.0 * QAM16_NORM);
        assert_eq!(slice(ComplexSample::new(0.5, -0.7)), ComplexSample::new(QAM16_NORM, -3.0 * QAM16_NORM));
    }

    proptest! {
        #[test]
        fn prop_demap_tolerates_sub_threshold_error(nibble in 0u8..16, dx in -0.99f64..0.99, dy in -0.99f64..0.99) {
            // Decision boundaries sit one QAM16_NORM away from every point
            let noisy = map_nibble(nibble) + ComplexSample::new(dx * QAM16_NORM, dy * QAM16_NORM);
            prop_assert_eq!(demap(noisy), nibble);
            prop_assert_eq!(slice(noisy), map_nibble(nibble));
        }
    }
}
