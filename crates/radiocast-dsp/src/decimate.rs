//! Integer-ratio FIR decimation.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::filter::{self, Filterable};

/// FIR decimation by the integer factor `input_size / output_size`.
///
/// Works on real and complex samples; the single-channel receive path
/// decimates raw I/Q with it. Two application modes:
///
/// * streaming (default): the anti-alias FIR is only evaluated at the kept
///   output samples, with the input tail carried across blocks, so block
///   boundaries stay continuous and the cost scales with the output rate;
/// * zero-phase: forward-and-reverse filtering of the whole block before
///   subsampling. No cross-block state, but the full input rate is
///   filtered twice, so this is for channel-rate blocks, not device-rate
///   ones.
pub struct Decimate<T: Filterable> {
    input_size: usize,
    output_size: usize,
    rate: usize,
    zero_phase: bool,
    taps: Vec<RealSample>,
    /// Last `taps - 1` input samples of the previous block (streaming mode).
    state: Vec<T>,
    /// Scratch holding state + current block, reused across runs.
    work: Vec<T>,
}

impl<T: Filterable> Decimate<T> {
    pub fn new(input_size: usize, output_size: usize, zero_phase: bool) -> Result<Self, DspError> {
        if input_size == 0 || output_size == 0 {
            return Err(DspError::InvalidArgument("decimator sizes must be greater than zero".to_string()));
        }
        if input_size % output_size != 0 {
            return Err(DspError::InvalidArgument(format!(
                "input size must be an integer multiple of output size ({}, {})",
                input_size, output_size
            )));
        }

        let rate = input_size / output_size;
        let taps = if rate > 1 {
            filter::firwin_lowpass(30 * rate + 1, 1.0 / rate as f64)
        } else {
            vec![1.0]
        };
        let state = vec![T::zero(); taps.len() - 1];
        let work = vec![T::zero(); state.len() + input_size];

        Ok(Self { input_size, output_size, rate, zero_phase, taps, state, work })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Decimate one block. Fails on a length mismatch.
    pub fn run(&mut self, input: &[T]) -> Result<Vec<T>, DspError> {
        if input.len() != self.input_size {
            return Err(DspError::SizeMismatch { expected: self.input_size, actual: input.len() });
        }
        if self.rate == 1 {
            return Ok(input.to_vec());
        }

        let output = if self.zero_phase {
            filter::filtfilt(&self.taps, &[1.0], input)
                .into_iter()
                .step_by(self.rate)
                .collect::<Vec<T>>()
        } else {
            self.run_streaming(input)
        };

        if output.len() != self.output_size {
            return Err(DspError::SizeMismatch { expected: self.output_size, actual: output.len() });
        }
        Ok(output)
    }

    fn run_streaming(&mut self, input: &[T]) -> Vec<T> {
        let history = self.state.len();
        self.work[..history].copy_from_slice(&self.state);
        self.work[history..].copy_from_slice(input);

        let mut output = Vec::with_capacity(self.output_size);
        for m in 0..self.output_size {
            let end = history + m * self.rate;
            let mut acc = T::zero();
            for (k, &tap) in self.taps.iter().enumerate() {
                acc = acc + self.work[end - k] * tap;
            }
            output.push(acc);
        }

        self.state.copy_from_slice(&self.work[self.work.len() - history..]);
        output
    }
}
