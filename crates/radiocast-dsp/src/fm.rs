//! Generic FM discriminator.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::demodulator::Demodulator;
use crate::resample::Resample;

/// Phase-difference FM demodulator.
///
/// For broadcast stations use [`crate::Mfm`] (mono) or [`crate::Wbfm`]
/// (stereo); those compose this discriminator.
///
/// The final unwrapped phase of each block is carried into the next one, so
/// the phase trajectory stays monotone across block boundaries and the
/// first difference of a block is real signal rather than a jump.
pub struct Fm {
    input_size: usize,
    output_size: usize,
    resample: Resample,
    last_phase: Option<RealSample>,
}

impl Fm {
    pub fn new(input_size: usize, output_size: usize) -> Result<Self, DspError> {
        Ok(Self {
            input_size,
            output_size,
            resample: Resample::new(input_size, output_size)?,
            last_phase: None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }
}

impl Demodulator for Fm {
    fn channels(&self) -> usize {
        1
    }

    fn run(&mut self, input: &[ComplexSample]) -> Result<Vec<AudioSample>, DspError> {
        if input.len() != self.input_size {
            return Err(DspError::SizeMismatch { expected: self.input_size, actual: input.len() });
        }

        // DC removal on the complex signal
        let mut mean = ComplexSample::ZERO;
        for value in input {
            mean += *value;
        }
        mean = mean * (1.0 / input.len() as RealSample);

        // Instantaneous phase, unwrapped to a monotone trajectory, then
        // differentiated. The phase carried over from the previous block
        // supplies the first difference; the very first block pads with a
        // trailing zero instead so every block yields input_size samples.
        let two_pi = 2.0 * sample_consts::PI;
        let first_block = self.last_phase.is_none();
        let mut previous = self.last_phase;
        let mut differences = Vec::with_capacity(input.len());
        for value in input {
            let raw = (*value - mean).arg();
            let unwrapped = match previous {
                Some(p) => raw + ((p - raw) / two_pi).round() * two_pi,
                None => raw,
            };
            if let Some(p) = previous {
                differences.push(unwrapped - p);
            }
            previous = Some(unwrapped);
        }
        if first_block {
            differences.push(0.0);
        }
        // Keep the carried phase bounded; shifting by whole turns does not
        // change the next block's differences
        self.last_phase = previous.map(|p| p - (p / two_pi).round() * two_pi);

        for difference in &mut differences {
            *difference /= sample_consts::PI;
        }

        self.resample.run(&differences)
    }
}
