//! Frequency-domain energy and entropy of a single channel.
//!
//! The series is zero-padded to the next power of two and transformed with an
//! unscaled forward DFT (`rustfft`). Only the real part of each bin is used:
//!
//! - energy  = Σ Re(X_k)²
//! - entropy = Σ −p·ln(p), with p = sqrt(|Re(X_k)|) / N_bins
//!
//! This is not a normalized Shannon entropy and it ignores phase entirely. The
//! deployed classifier was trained on exactly these values, so they are
//! reproduced as-is. A bin with p = 0 contributes 0 (the limit of −p·ln p).

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Energy and entropy of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectralFeatures {
    pub energy: f32,
    pub entropy: f32,
}

/// Reusable FFT front end. The plan for the last transform length is kept;
/// frames of a fixed size therefore plan once.
pub struct SpectralAnalyzer {
    plan: Option<Arc<dyn Fft<f64>>>,
    scratch: Vec<Complex<f64>>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("plan_len", &self.plan.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            plan: None,
            scratch: Vec::new(),
        }
    }

    /// Transform length used for a series of `len` samples.
    pub fn padded_len(len: usize) -> usize {
        len.max(1).next_power_of_two()
    }

    /// Computes energy and entropy of `series`.
    pub fn analyze(&mut self, series: &[f32]) -> SpectralFeatures {
        let n = Self::padded_len(series.len());
        let fft = self.plan_for(n);

        let mut buffer: Vec<Complex<f64>> = series
            .iter()
            .map(|&v| Complex::new(v as f64, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(n)
            .collect();

        let scratch_len = fft.get_inplace_scratch_len();
        if self.scratch.len() < scratch_len {
            self.scratch.resize(scratch_len, Complex::new(0.0, 0.0));
        }
        fft.process_with_scratch(&mut buffer, &mut self.scratch[..scratch_len]);

        SpectralFeatures {
            energy: energy(&buffer) as f32,
            entropy: entropy(&buffer) as f32,
        }
    }

    fn plan_for(&mut self, n: usize) -> Arc<dyn Fft<f64>> {
        match &self.plan {
            Some(plan) if plan.len() == n => Arc::clone(plan),
            _ => {
                let plan = FftPlanner::new().plan_fft_forward(n);
                self.plan = Some(Arc::clone(&plan));
                plan
            }
        }
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn energy(bins: &[Complex<f64>]) -> f64 {
    bins.iter().map(|c| c.re * c.re).sum()
}

fn entropy(bins: &[Complex<f64>]) -> f64 {
    let n_bins = bins.len() as f64;
    bins.iter()
        .map(|c| {
            let p = c.re.abs().sqrt() / n_bins;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_padded_len() {
        assert_eq!(SpectralAnalyzer::padded_len(0), 1);
        assert_eq!(SpectralAnalyzer::padded_len(1), 1);
        assert_eq!(SpectralAnalyzer::padded_len(50), 64);
        assert_eq!(SpectralAnalyzer::padded_len(64), 64);
        assert_eq!(SpectralAnalyzer::padded_len(65), 128);
    }

    #[test]
    fn test_zero_series_has_zero_energy_and_entropy() {
        let mut analyzer = SpectralAnalyzer::new();
        for len in [0, 1, 7, 50, 64, 100] {
            let features = analyzer.analyze(&vec![0.0; len]);
            assert_eq!(features.energy, 0.0, "len {len}");
            assert_eq!(features.entropy, 0.0, "len {len}");
            assert!(!features.entropy.is_nan());
        }
    }

    #[test]
    fn test_constant_series_concentrates_in_dc_bin() {
        // 8 ones, no padding: X_0 = 8, every other bin 0.
        let mut analyzer = SpectralAnalyzer::new();
        let features = analyzer.analyze(&[1.0; 8]);

        assert_abs_diff_eq!(features.energy, 64.0, epsilon = 1e-4);
        let p = 8.0f64.sqrt() / 8.0;
        assert_abs_diff_eq!(features.entropy, (-p * p.ln()) as f32, epsilon = 1e-5);
    }

    #[test]
    fn test_impulse_spreads_over_all_bins() {
        // A unit impulse transforms to X_k = 1 for every k.
        let mut analyzer = SpectralAnalyzer::new();
        let mut series = vec![0.0; 16];
        series[0] = 1.0;
        let features = analyzer.analyze(&series);

        assert_abs_diff_eq!(features.energy, 16.0, epsilon = 1e-4);
        let p = 1.0f64 / 16.0;
        assert_abs_diff_eq!(features.entropy, (16.0 * -p * p.ln()) as f32, epsilon = 1e-5);
    }

    #[test]
    fn test_imaginary_part_is_ignored() {
        // sin at bin 1 of an 8-point transform is purely imaginary.
        let series: Vec<f32> = (0..8)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 8.0).sin())
            .collect();
        let mut analyzer = SpectralAnalyzer::new();
        let features = analyzer.analyze(&series);

        assert_abs_diff_eq!(features.energy, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_padding_matches_explicit_zeros() {
        let series: Vec<f32> = (0..50).map(|i| (i as f32 * 0.3).cos() * 2.0).collect();
        let mut padded = series.clone();
        padded.resize(64, 0.0);

        let mut analyzer = SpectralAnalyzer::new();
        let a = analyzer.analyze(&series);
        let b = analyzer.analyze(&padded);
        assert_eq!(a, b);
    }

    #[test]
    fn test_analyzer_reuse_across_lengths() {
        let mut analyzer = SpectralAnalyzer::new();
        let first = analyzer.analyze(&[1.0; 8]);
        analyzer.analyze(&[1.0; 32]);
        let again = analyzer.analyze(&[1.0; 8]);
        assert_eq!(first, again);
    }
}
