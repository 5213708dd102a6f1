//! Mono broadcast FM demodulator.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::deemphasis::Deemphasis;
use crate::demodulator::{DcHistory, Demodulator};
use crate::fm::Fm;

/// Mono demodulator for broadcast FM stations.
///
/// For stereo stations use [`crate::Wbfm`]; for plain FM telemetry use
/// [`crate::Fm`].
pub struct Mfm {
    fm: Fm,
    deemphasis: Deemphasis,
    dc: DcHistory,
}

impl Mfm {
    pub fn new(input_size: usize, output_size: usize, deemphasis: f64) -> Result<Self, DspError> {
        Ok(Self {
            fm: Fm::new(input_size, output_size)?,
            deemphasis: Deemphasis::new(output_size, deemphasis)?,
            dc: DcHistory::new(),
        })
    }
}

impl Demodulator for Mfm {
    fn channels(&self) -> usize {
        1
    }

    fn run(&mut self, input: &[ComplexSample]) -> Result<Vec<AudioSample>, DspError> {
        let audio = self.fm.run(input)?;
        let audio = self.deemphasis.run(&audio)?;

        let block_mean = audio.iter().sum::<RealSample>() / audio.len() as RealSample;
        self.dc.push(block_mean);
        let dc = self.dc.mean();

        Ok(audio.iter().map(|v| (v - dc).clamp(-0.999, 0.999)).collect())
    }
}
