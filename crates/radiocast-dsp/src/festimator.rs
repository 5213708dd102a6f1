//! Dominant-frequency estimation.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::fft::Planner;

/// Estimates the dominant frequency of a real signal.
///
/// Takes the magnitude peak of the one-sided spectrum and refines it by
/// parabolic interpolation over the log magnitudes of the three bins
/// around the peak, which recovers sub-bin accuracy for tones that do not
/// land on a bin center.
pub struct FreqEstimator {
    sample_rate: f64,
    planner: Planner,
}

impl FreqEstimator {
    pub fn new(sample_rate: f64) -> Result<Self, DspError> {
        if sample_rate <= 0.0 {
            return Err(DspError::InvalidArgument("sample rate must be positive".to_string()));
        }
        Ok(Self { sample_rate, planner: Planner::new() })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Estimate the dominant frequency of `signal` in Hz.
    pub fn estimate(&mut self, signal: &[RealSample]) -> Result<f64, DspError> {
        if signal.len() < 4 {
            return Err(DspError::InvalidArgument("signal is too short to estimate a frequency".to_string()));
        }

        let n = signal.len();
        let mut buffer: Vec<ComplexSample> = signal.iter().map(|&v| ComplexSample::new(v, 0.0)).collect();
        self.planner.plan_fft_forward(n).process(&mut buffer);

        let magnitudes: Vec<f64> = buffer[..n / 2 + 1].iter().map(|v| v.norm() as f64).collect();
        let peak = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let bin = if peak == 0 || peak == magnitudes.len() - 1 {
            peak as f64
        } else {
            parabolic_peak(&magnitudes, peak)
        };
        Ok(self.sample_rate * bin / n as f64)
    }
}

/// Vertex of the parabola through the log magnitudes around bin `x`.
fn parabolic_peak(magnitudes: &[f64], x: usize) -> f64 {
    let floor = 1e-12;
    let left = magnitudes[x - 1].max(floor).ln();
    let center = magnitudes[x].max(floor).ln();
    let right = magnitudes[x + 1].max(floor).ln();

    let denominator = left - 2.0 * center + right;
    if denominator == 0.0 {
        return x as f64;
    }
    x as f64 + 0.5 * (left - right) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize, frequency: f64, rate: f64) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * frequency * i as f64 / rate).sin() as f32)
            .collect()
    }

    #[test]
    fn test_on_bin_tone() {
        let mut estimator = FreqEstimator::new(48_000.0).unwrap();
        let signal = tone(4_800, 1_000.0, 48_000.0);
        let estimate = estimator.estimate(&signal).unwrap();
        assert!((estimate - 1_000.0).abs() < 1.0, "estimate {}", estimate);
    }

    #[test]
    fn test_between_bins() {
        // Bin spacing is 10 Hz; the tone sits off-center
        let mut estimator = FreqEstimator::new(48_000.0).unwrap();
        let signal = tone(4_800, 443.0, 48_000.0);
        let estimate = estimator.estimate(&signal).unwrap();
        assert!((estimate - 443.0).abs() < 3.0, "estimate {}", estimate);
    }

    #[test]
    fn test_short_signal_rejected() {
        let mut estimator = FreqEstimator::new(48_000.0).unwrap();
        assert!(estimator.estimate(&[0.0, 0.0]).is_err());
        assert!(FreqEstimator::new(0.0).is_err());
    }
}
