//! Common interface of the FM demodulator family.

use std::collections::VecDeque;

use radiocast_config::DemodulatorKind;
use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::{Fm, Mfm, Wbfm};

/// Number of recent block means the DC estimate averages over.
const DC_WINDOW: usize = 32;

/// Bounded history of block-mean DC values.
///
/// Averaging the means of recent blocks removes residual tuning offset
/// without the level jump a plain per-block mean would cause at every
/// block boundary.
pub struct DcHistory {
    values: VecDeque<RealSample>,
}

impl DcHistory {
    pub fn new() -> Self {
        Self { values: VecDeque::with_capacity(DC_WINDOW) }
    }

    pub fn push(&mut self, block_mean: RealSample) {
        if self.values.len() == DC_WINDOW {
            self.values.pop_front();
        }
        self.values.push_back(block_mean);
    }

    pub fn mean(&self) -> RealSample {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<RealSample>() / self.values.len() as RealSample
    }
}

impl Default for DcHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// One member of the FM demodulator family.
///
/// `run` consumes one block of channelized I/Q and produces one block of
/// audio; stereo demodulators interleave L,R frames. Implementations carry
/// continuity state and must be driven by exactly one thread.
pub trait Demodulator: Send {
    /// Number of audio channels in the output.
    fn channels(&self) -> usize;

    /// Demodulate one block of baseband I/Q into audio samples.
    fn run(&mut self, input: &[ComplexSample]) -> Result<Vec<AudioSample>, DspError>;
}

/// Build the demodulator selected in the configuration.
pub fn build_demodulator(
    kind: DemodulatorKind,
    input_size: usize,
    output_size: usize,
    deemphasis: f64,
) -> Result<Box<dyn Demodulator>, DspError> {
    Ok(match kind {
        DemodulatorKind::Fm => Box::new(Fm::new(input_size, output_size)?),
        DemodulatorKind::Mfm => Box::new(Mfm::new(input_size, output_size, deemphasis)?),
        DemodulatorKind::Wbfm => Box::new(Wbfm::new(input_size, output_size, deemphasis)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_history_bounded() {
        let mut dc = DcHistory::new();
        assert_eq!(dc.mean(), 0.0);

        for _ in 0..100 {
            dc.push(2.0);
        }
        dc.push(2.0);
        assert!((dc.mean() - 2.0).abs() < 1e-7);
        assert!(dc.values.len() <= DC_WINDOW);
    }

    #[test]
    fn test_factory_channel_counts() {
        let fm = build_demodulator(DemodulatorKind::Fm, 1000, 500, 75e-6).unwrap();
        assert_eq!(fm.channels(), 1);
        let mfm = build_demodulator(DemodulatorKind::Mfm, 1000, 500, 75e-6).unwrap();
        assert_eq!(mfm.channels(), 1);
        let wbfm = build_demodulator(DemodulatorKind::Wbfm, 250_000, 48_000, 75e-6).unwrap();
        assert_eq!(wbfm.channels(), 2);
    }
}
