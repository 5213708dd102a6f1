//! Arbitrary-ratio sample-rate conversion.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::fft::{self, Planner};
use crate::filter;

/// Rate conversion in two stages: the integer part of the ratio is removed
/// by polyphase FIR decimation, the remainder by a band-limited resample to
/// exactly `output_size` samples. Handles the broadcast case where the
/// channel rate is not an integer multiple of the audio rate.
pub struct Resample {
    input_size: usize,
    output_size: usize,
    rate: usize,
    taps: Vec<RealSample>,
    planner: Planner,
}

impl Resample {
    pub fn new(input_size: usize, output_size: usize) -> Result<Self, DspError> {
        if input_size == 0 || output_size == 0 || input_size < output_size {
            return Err(DspError::InvalidArgument(format!(
                "resampler cannot go from {} to {} samples",
                input_size, output_size
            )));
        }

        let rate = input_size / output_size;
        let taps = if rate > 1 {
            filter::firwin_lowpass(2 * 10 * rate + 1, 1.0 / rate as f64)
        } else {
            Vec::new()
        };

        Ok(Self { input_size, output_size, rate, taps, planner: Planner::new() })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Convert one block. Fails on a length mismatch.
    pub fn run(&mut self, input: &[RealSample]) -> Result<Vec<RealSample>, DspError> {
        if input.len() != self.input_size {
            return Err(DspError::SizeMismatch { expected: self.input_size, actual: input.len() });
        }

        let decimated;
        let intermediate = if self.rate > 1 {
            decimated = filter::poly_decimate(&self.taps, input, self.rate);
            &decimated[..]
        } else {
            input
        };

        if intermediate.len() == self.output_size {
            return Ok(intermediate.to_vec());
        }

        let output = fft::resample_real(&mut self.planner, intermediate, self.output_size);
        if output.len() != self.output_size {
            return Err(DspError::SizeMismatch { expected: self.output_size, actual: output.len() });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_sizes_match() {
        let mut resample = Resample::new(128, 128).unwrap();
        let x: Vec<f32> = (0..128).map(|i| (i as f32).sin()).collect();
        assert_eq!(resample.run(&x).unwrap(), x);
    }

    #[test]
    fn test_upsampling_rejected() {
        assert!(Resample::new(100, 200).is_err());
    }

    #[test]
    fn test_non_integer_ratio() {
        // 2500 -> 480: integer part 5, then 500 -> 480
        let n = 2500;
        let m = 480;
        let mut resample = Resample::new(n, m).unwrap();
        let x: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 10.0 * i as f32 / n as f32).sin())
            .collect();

        let y = resample.run(&x).unwrap();
        assert_eq!(y.len(), m);
        for (i, value) in y.iter().enumerate().skip(48).take(m - 96) {
            let expected = (2.0 * std::f32::consts::PI * 10.0 * i as f32 / m as f32).sin();
            assert!((value - expected).abs() < 0.05, "sample {}: {} vs {}", i, value, expected);
        }
    }
}
