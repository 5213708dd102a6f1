//! Zero-phase FIR bandpass filter.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::filter;

pub const DEFAULT_NUM_TAPS: usize = 51;

/// Windowed-sinc bandpass applied forward and reverse, so the passband
/// keeps its phase. Band edges are in Hz and are normalized against the
/// block length, which doubles as the sample rate (blocks are one second
/// long).
pub struct Bandpass {
    input_size: usize,
    taps: Vec<RealSample>,
}

impl Bandpass {
    pub fn new(input_size: usize, start_freq: f64, stop_freq: f64) -> Result<Self, DspError> {
        Self::with_taps(input_size, start_freq, stop_freq, DEFAULT_NUM_TAPS)
    }

    pub fn with_taps(
        input_size: usize,
        start_freq: f64,
        stop_freq: f64,
        num_taps: usize,
    ) -> Result<Self, DspError> {
        if input_size == 0 || num_taps < 3 {
            return Err(DspError::InvalidArgument("bandpass needs a block size and at least 3 taps".to_string()));
        }
        let nyquist = 0.5 * input_size as f64;
        if !(start_freq > 0.0 && start_freq < stop_freq && stop_freq < nyquist) {
            return Err(DspError::InvalidArgument(format!(
                "band edges ({}, {}) must satisfy 0 < start < stop < {}",
                start_freq, stop_freq, nyquist
            )));
        }

        Ok(Self {
            input_size,
            taps: filter::firwin_bandpass(num_taps, start_freq / nyquist, stop_freq / nyquist),
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Filter one block. Fails on a length mismatch.
    pub fn run(&self, input: &[RealSample]) -> Result<Vec<RealSample>, DspError> {
        if input.len() != self.input_size {
            return Err(DspError::SizeMismatch { expected: self.input_size, actual: input.len() });
        }
        Ok(filter::filtfilt(&self.taps, &[1.0], input))
    }
}
