//! Stereo broadcast FM demodulator.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::bandpass::Bandpass;
use crate::deemphasis::Deemphasis;
use crate::demodulator::{DcHistory, Demodulator};
use crate::fm::Fm;
use crate::pll::Pll;
use crate::resample::Resample;

/// Pilot tone frequency of the stereo multiplex.
pub const PILOT_FREQ: f64 = 19e3;

/// Gain applied to the recovered L−R component. Compensates the sub-carrier
/// path loss through the bandpass and mixer.
const SUBCARRIER_SCALE: RealSample = 1.0175;

/// Stereo demodulator for broadcast FM stations.
///
/// The composite baseband is discriminated at the full channel rate so the
/// pilot (19 kHz) and the L−R sub-carrier (23–53 kHz) survive. The PLL
/// doubles the pilot into a coherent 38 kHz reference that mixes the
/// sub-carrier down, and the L+R / L−R pair is matrixed into left and
/// right before per-channel deemphasis.
pub struct Wbfm {
    output_size: usize,
    fm: Fm,
    pilot_filter: Bandpass,
    lmr_filter: Bandpass,
    pll: Pll,
    resample: Resample,
    left_deemphasis: Deemphasis,
    right_deemphasis: Deemphasis,
    dc: DcHistory,
}

impl Wbfm {
    pub fn new(input_size: usize, output_size: usize, deemphasis: f64) -> Result<Self, DspError> {
        Ok(Self {
            output_size,
            // Composite stays at the channel rate
            fm: Fm::new(input_size, input_size)?,
            pilot_filter: Bandpass::new(input_size, PILOT_FREQ - 100.0, PILOT_FREQ + 100.0)?,
            lmr_filter: Bandpass::new(input_size, 23e3, 53e3)?,
            pll: Pll::new(),
            resample: Resample::new(input_size, output_size)?,
            left_deemphasis: Deemphasis::new(output_size, deemphasis)?,
            right_deemphasis: Deemphasis::new(output_size, deemphasis)?,
            dc: DcHistory::new(),
        })
    }
}

impl Demodulator for Wbfm {
    fn channels(&self) -> usize {
        2
    }

    /// Demodulate one block into interleaved L,R frames.
    fn run(&mut self, input: &[ComplexSample]) -> Result<Vec<AudioSample>, DspError> {
        let composite = self.fm.run(input)?;

        // Filter the pilot and update the PLL
        let pilot = self.pilot_filter.run(&composite)?;
        self.pll.step(&pilot);

        // Mix the L−R sub-carrier down with the doubled pilot
        let carrier = self.pll.wave(2)?;
        let mut lmr = self.lmr_filter.run(&composite)?;
        for (value, reference) in lmr.iter_mut().zip(&carrier) {
            *value = *value * reference * SUBCARRIER_SCALE;
        }

        // Matrix L+R and L−R into left and right
        let sum: Vec<RealSample> = composite.iter().zip(&lmr).map(|(m, s)| m + s).collect();
        let difference: Vec<RealSample> = composite.iter().zip(&lmr).map(|(m, s)| m - s).collect();

        let left = self.resample.run(&sum)?;
        let right = self.resample.run(&difference)?;
        let left = self.left_deemphasis.run(&left)?;
        let right = self.right_deemphasis.run(&right)?;

        // One shared DC estimate for the stereo pair
        let block_mean = (left.iter().sum::<RealSample>() + right.iter().sum::<RealSample>())
            / (2 * self.output_size) as RealSample;
        self.dc.push(block_mean);
        let dc = self.dc.mean();

        let mut output = Vec::with_capacity(2 * self.output_size);
        for (l, r) in left.iter().zip(&right) {
            output.push((l - dc).clamp(-0.999, 0.999));
            output.push((r - dc).clamp(-0.999, 0.999));
        }
        Ok(output)
    }
}
