//! Discrete Fourier amplitude spectrum by direct summation.
//!
//! O(n²); measurement series here are a few thousand points at most.
// TODO: switch to a radix-2 FFT if series beyond ~10k points need spectra.

use std::f64::consts::PI;

use echem_core::{Result, Series};

/// Single-sided amplitude spectrum: `floor(n/2)` (frequency, amplitude) pairs.
///
/// Sample rate is derived from the x span as `(n - 1) / span`; a zero span
/// falls back to cycles per sample. Amplitudes are scaled so a pure sinusoid
/// on an exact bin reports its own amplitude.
pub fn spectrum(series: &Series) -> Result<Series> {
    series.require_len(1, "spectral")?;
    let y = series.y();
    let n = y.len();
    let bins = n / 2;

    let x = series.x();
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    let sample_rate = if span > 0.0 && span.is_finite() {
        (n - 1) as f64 / span
    } else {
        1.0
    };

    let mut freqs = Vec::with_capacity(bins);
    let mut amps = Vec::with_capacity(bins);
    for k in 0..bins {
        let mut re = 0.0;
        let mut im = 0.0;
        for (j, v) in y.iter().enumerate() {
            // Reduce k*j mod n first so the angle stays small and accurate.
            let phase = 2.0 * PI * ((k * j) % n) as f64 / n as f64;
            re += v * phase.cos();
            im -= v * phase.sin();
        }
        let magnitude = (re * re + im * im).sqrt() / n as f64;
        freqs.push(k as f64 * sample_rate / n as f64);
        amps.push(if k == 0 { magnitude } else { 2.0 * magnitude });
    }

    Ok(Series::new(freqs, amps)?.with_domain(series.domain()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_sine_peaks_at_its_frequency() {
        let n = 64;
        let dt = 1.0 / 64.0;
        let x: Vec<f64> = (0..n).map(|j| j as f64 * dt).collect();
        let y: Vec<f64> = x.iter().map(|t| 2.0 * (2.0 * PI * 4.0 * t).sin() + 0.5).collect();
        let s = spectrum(&Series::new(x, y).unwrap()).unwrap();

        assert_eq!(s.len(), 32);
        assert!((s.x()[4] - 4.0).abs() < 1e-9);
        assert!((s.y()[4] - 2.0).abs() < 1e-9);
        assert!((s.y()[0] - 0.5).abs() < 1e-9);
        for (k, a) in s.y().iter().enumerate() {
            if k != 0 && k != 4 {
                assert!(a.abs() < 1e-9, "bin {} leaked {}", k, a);
            }
        }
    }

    #[test]
    fn frequency_axis_uses_x_span() {
        // Same samples, x axis stretched 10x: frequencies shrink 10x.
        let y = vec![0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        let fast = spectrum(&Series::new((0..8).map(|i| i as f64).collect(), y.clone()).unwrap()).unwrap();
        let slow =
            spectrum(&Series::new((0..8).map(|i| i as f64 * 10.0).collect(), y).unwrap()).unwrap();
        for k in 0..4 {
            assert!((fast.x()[k] - 10.0 * slow.x()[k]).abs() < 1e-12);
        }
        assert_eq!(fast.y(), slow.y());
    }

    #[test]
    fn odd_length_floors_bins() {
        let s = spectrum(&Series::from_y(vec![1.0; 7])).unwrap();
        assert_eq!(s.len(), 3);
        assert!((s.y()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_span_uses_cycles_per_sample() {
        let s = spectrum(&Series::new(vec![0.0; 4], vec![1.0, 0.0, 1.0, 0.0]).unwrap()).unwrap();
        assert_eq!(s.x(), &[0.0, 0.25]);
    }
}
