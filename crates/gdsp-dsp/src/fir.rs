use gdsp_core::{ComplexSample, GdspError, GdspResult, RealSample};

/// Centred same-length convolution with real taps:
/// `y[n] = sum_k h[k] * x[n + (N-1)/2 - k]`, zero outside the input.
/// Output sample `n` lines up with input sample `n` for a symmetric filter.
pub fn convolve_same(x: &[ComplexSample], h: &[RealSample]) -> Vec<ComplexSample> {
    if h.is_empty() {
        return vec![ComplexSample::new(0.0, 0.0); x.len()];
    }
    let center = (h.len() - 1) / 2;
    (0..x.len())
        .map(|n| {
            // Valid k range keeps n + center - k inside [0, len)
            let k_lo = (n + center + 1).saturating_sub(x.len());
            let k_hi = (n + center).min(h.len() - 1);
            let mut acc = ComplexSample::new(0.0, 0.0);
            for k in k_lo..=k_hi {
                acc += x[n + center - k] * h[k];
            }
            acc
        })
        .collect()
}

/// Full linear convolution of two real sequences, length `a + b - 1`
pub fn convolve_full(a: &[RealSample], b: &[RealSample]) -> Vec<RealSample> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Zero-insertion upsampling: symbol `k` lands on sample `k * sps`
pub fn upsample(symbols: &[ComplexSample], sps: usize) -> GdspResult<Vec<ComplexSample>> {
    if sps == 0 {
        return Err(GdspError::InvalidSps);
    }
    let mut out = vec![ComplexSample::new(0.0, 0.0); symbols.len() * sps];
    for (k, &s) in symbols.iter().enumerate() {
        out[k * sps] = s;
    }
    Ok(out)
}

/// Transmit pulse shaping: upsample, then filter with `h`
pub fn pulse_shape(symbols: &[ComplexSample], h: &[RealSample], sps: usize) -> GdspResult<Vec<ComplexSample>> {
    let up = upsample(symbols, sps)?;
    Ok(convolve_same(&up, h))
}
