//! Numeric transforms from a raw segment to its power spectrum.
//!
//! The chain for one segment is:
//! 1. [`remove_dc_offset`] subtracts the segment mean,
//! 2. [`symmetrize`] mirrors the one-sided function around lag zero,
//! 3. [`SpectrumAnalyzer::compute`] takes the DFT magnitude in decibels.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::SpectrumConfig;

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Subtract the mean from every sample.
pub fn remove_dc_offset(samples: &[f64]) -> Vec<f64> {
    let offset = mean(samples);
    samples.iter().map(|&v| v - offset).collect()
}

/// Autocorrelation mirrored around lag zero.
#[derive(Debug, Clone)]
pub struct SymmetrizedAutocorrelation {
    /// Values for lags `-(N-1)..=(N-1)`; length `2N-1`.
    pub values: Vec<f64>,
}

impl SymmetrizedAutocorrelation {
    /// Returns the number of lags.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for the symmetrization of an empty segment.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of lag zero.
    #[inline]
    pub fn center(&self) -> usize {
        self.values.len() / 2
    }

    /// Signed lag for every value, `-(N-1)` first.
    pub fn lags(&self) -> impl Iterator<Item = i64> + '_ {
        let center = self.center() as i64;
        (0..self.values.len() as i64).map(move |i| i - center)
    }

    /// `(lag, value)` pairs in storage order.
    pub fn points(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.lags().zip(self.values.iter().copied())
    }
}

/// Mirror a one-sided autocorrelation into an even sequence of length `2N-1`.
///
/// Index `N-1+k` and `N-1-k` both hold `one_sided[k]`.
pub fn symmetrize(one_sided: &[f64]) -> SymmetrizedAutocorrelation {
    let n = one_sided.len();
    if n == 0 {
        return SymmetrizedAutocorrelation { values: Vec::new() };
    }

    let mut values = Vec::with_capacity(2 * n - 1);
    values.extend(one_sided.iter().rev());
    values.extend(one_sided.iter().skip(1));

    SymmetrizedAutocorrelation { values }
}

/// DC removal followed by symmetrization.
pub fn prepare_autocorrelation(samples: &[f64]) -> SymmetrizedAutocorrelation {
    symmetrize(&remove_dc_offset(samples))
}

/// Convert a magnitude to decibels, clamping at `floor` first.
///
/// `floor` must be positive; the result is then finite for every input,
/// including zero and NaN magnitudes.
#[inline]
pub fn magnitude_to_db(magnitude: f64, floor: f64) -> f64 {
    // f64::max ignores a NaN operand
    20.0 * magnitude.max(floor).log10()
}

/// Spectrum of one symmetrized autocorrelation.
#[derive(Debug, Clone)]
pub struct PowerSpectrum {
    /// Bin frequencies `i * fs / L` in Hz.
    pub frequencies: Vec<f64>,
    /// Unnormalized DFT magnitudes.
    pub magnitudes: Vec<f64>,
    /// `20 * log10(max(magnitude, floor))`.
    pub decibels: Vec<f64>,
}

impl PowerSpectrum {
    /// Returns the number of bins.
    #[inline]
    pub fn len(&self) -> usize {
        self.decibels.len()
    }

    /// Returns true if the spectrum has no bins.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.decibels.is_empty()
    }

    /// Number of bins with non-negative frequency (`L/2 + 1`).
    pub fn display_len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.len() / 2 + 1
        }
    }

    /// `(frequency, dB)` pairs of the non-negative half.
    ///
    /// Both the static and the interactive plot are fed from this.
    pub fn display_points(&self) -> Vec<(f64, f64)> {
        let n = self.display_len();
        self.frequencies[..n]
            .iter()
            .copied()
            .zip(self.decibels[..n].iter().copied())
            .collect()
    }
}

/// Forward DFT magnitude spectrum in decibels.
///
/// The transform is unwindowed and unnormalized: bin `k` is
/// `sum_n x[n] * exp(-2πi·k·n/L)`. Plans are cached by the planner, so one
/// analyzer should be reused across segments of the same length.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f64>,
    sampling_rate_hz: f64,
    magnitude_floor: f64,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for the given sampling rate and magnitude floor.
    pub fn new(sampling_rate_hz: f64, magnitude_floor: f64) -> Self {
        Self {
            planner: FftPlanner::new(),
            sampling_rate_hz,
            magnitude_floor,
        }
    }

    /// Create an analyzer from the spectrum section of the configuration.
    pub fn from_config(config: &SpectrumConfig) -> Self {
        Self::new(config.sampling_rate_hz, config.magnitude_floor)
    }

    /// Compute the decibel spectrum of a real sequence.
    pub fn compute(&mut self, signal: &[f64]) -> PowerSpectrum {
        let len = signal.len();
        if len == 0 {
            return PowerSpectrum {
                frequencies: Vec::new(),
                magnitudes: Vec::new(),
                decibels: Vec::new(),
            };
        }

        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        let fft = self.planner.plan_fft_forward(len);
        fft.process(&mut buffer);

        let df = self.sampling_rate_hz / len as f64;
        let frequencies = (0..len).map(|i| i as f64 * df).collect();
        let magnitudes: Vec<f64> = buffer.iter().map(|c| c.norm()).collect();
        let decibels = magnitudes
            .iter()
            .map(|&m| magnitude_to_db(m, self.magnitude_floor))
            .collect();

        PowerSpectrum {
            frequencies,
            magnitudes,
            decibels,
        }
    }
}
