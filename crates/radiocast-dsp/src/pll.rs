//! Pilot-tracking PLL built on the Hilbert transform.

use radiocast_core::sample_types::*;
use radiocast_core::DspError;

use crate::fft::{self, Planner};

/// Phase-locked reference signal generator.
///
/// `step` captures the analytic signal of a (bandpass-filtered) pilot;
/// `wave` derives a unit-amplitude reference whose phase is the pilot phase
/// times an integer. Stereo FM uses `wave(2)` to regenerate the 38 kHz
/// sub-carrier from the 19 kHz pilot. Apart from the captured analytic
/// buffer there is no cross-call state.
pub struct Pll {
    planner: Planner,
    analytic: Option<Vec<ComplexSample>>,
}

impl Pll {
    pub fn new() -> Self {
        Self { planner: Planner::new(), analytic: None }
    }

    /// Capture the analytic signal of the pilot block.
    pub fn step(&mut self, input: &[RealSample]) {
        self.analytic = Some(fft::hilbert(&mut self.planner, input));
    }

    /// Unit-magnitude real reference with the analytic phase raised by `mult`.
    /// Fails when no `step` has happened yet.
    pub fn wave(&self, mult: i32) -> Result<Vec<RealSample>, DspError> {
        let analytic = self
            .analytic
            .as_ref()
            .ok_or(DspError::NotReady("pll wave requires a prior step"))?;

        Ok(analytic
            .iter()
            .map(|a| {
                let raised = a.powi(mult);
                let magnitude = raised.norm();
                if magnitude > 0.0 {
                    raised.re / magnitude
                } else {
                    0.0
                }
            })
            .collect())
    }
}

impl Default for Pll {
    fn default() -> Self {
        Self::new()
    }
}
