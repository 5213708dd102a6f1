//! FM broadcast deemphasis filter.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::filter;

/// Length of the FIR expansion of the single-pole deemphasis response.
pub const FIR_LENGTH: usize = 51;

/// First-order lowpass with time constant `tau`, the inverse of the
/// transmitter pre-emphasis. The pole `x = exp(-1/(rate * tau))` gives the
/// IIR `b = [1-x], a = [1, -x]`, expanded here into its 51-tap impulse
/// response so only an FIR has to run per block. Filter memory persists
/// across calls, so block boundaries stay continuous.
pub struct Deemphasis {
    input_size: usize,
    taps: Vec<RealSample>,
    state: Vec<RealSample>,
}

impl Deemphasis {
    pub fn new(input_size: usize, tau: f64) -> Result<Self, DspError> {
        if input_size == 0 || tau <= 0.0 {
            return Err(DspError::InvalidArgument("deemphasis needs a block size and a positive time constant".to_string()));
        }

        let x = (-1.0 / (input_size as f64 * tau)).exp();
        let taps: Vec<RealSample> = (0..FIR_LENGTH)
            .map(|n| ((1.0 - x) * x.powi(n as i32)) as RealSample)
            .collect();
        let state = filter::lfilter_zi(&taps, &[1.0]);

        Ok(Self { input_size, taps, state })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Deemphasize one block. Fails on a length mismatch.
    pub fn run(&mut self, input: &[RealSample]) -> Result<Vec<RealSample>, DspError> {
        if input.len() != self.input_size {
            return Err(DspError::SizeMismatch { expected: self.input_size, actual: input.len() });
        }
        Ok(filter::lfilter(&self.taps, &[1.0], input, &mut self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_response() {
        let rate = 48_000;
        let tau = 75e-6;
        let mut deemphasis = Deemphasis::new(rate, tau).unwrap();

        // State starts at steady state for unit input, so knock it down first
        let silence = vec![0.0f32; rate];
        let _ = deemphasis.run(&silence).unwrap();

        let step = vec![1.0f32; rate];
        let output = deemphasis.run(&step).unwrap();

        // Steady-state gain is 1
        assert!((output[rate - 1] - 1.0).abs() < 1e-3);

        // 63% of the final value after roughly tau * rate samples
        let tau_samples = (tau * rate as f64) as usize;
        let at_tau = output[tau_samples];
        assert!((at_tau - 0.632).abs() < 0.05, "63% point was {}", at_tau);
    }

    #[test]
    fn test_state_persists_across_blocks() {
        let n = 4800;
        let tau = 75e-6;
        let mut deemphasis = Deemphasis::new(n, tau).unwrap();

        let input: Vec<f32> = (0..2 * n)
            .map(|i| (2.0 * std::f32::consts::PI * 7.0 * i as f32 / n as f32).sin())
            .collect();

        let mut blocked = deemphasis.run(&input[..n]).unwrap();
        blocked.extend(deemphasis.run(&input[n..]).unwrap());

        // Reference: one uninterrupted streaming pass with the same taps
        let x = (-1.0 / (n as f64 * tau)).exp();
        let taps: Vec<f32> = (0..FIR_LENGTH)
            .map(|k| ((1.0 - x) * x.powi(k as i32)) as f32)
            .collect();
        let mut z = filter::lfilter_zi(&taps, &[1.0]);
        let reference = filter::lfilter(&taps, &[1.0], &input, &mut z);

        for (a, b) in blocked.iter().zip(&reference) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut deemphasis = Deemphasis::new(4800, 75e-6).unwrap();
        assert!(deemphasis.run(&vec![0.0; 100]).is_err());
    }
}
